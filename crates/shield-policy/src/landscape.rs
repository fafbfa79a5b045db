//! Landscape loader (spec §4 [LANDSCAPE LOADER], §6 "Landscape XML").

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::error::{PolicyError, Result};

/// `node-id -> capability-set`, as loaded from the landscape XML file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Landscape {
    resources: HashMap<String, HashSet<String>>,
}

impl Landscape {
    pub fn capabilities_of(&self, node_id: &str) -> Option<&HashSet<String>> {
        self.resources.get(node_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &HashSet<String>)> {
        self.resources.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns true if some node in the landscape can satisfy `capabilities`
    /// (spec §4.2 step 3 / §4.4 step 1: "capabilities are a subset of some
    /// landscape node's capabilities").
    pub fn has_node_satisfying(&self, capabilities: &HashSet<String>) -> bool {
        self.resources.values().any(|caps| capabilities.is_subset(caps))
    }

    /// All `(node-id, capabilities)` pairs that satisfy `capabilities`.
    pub fn nodes_satisfying<'a>(
        &'a self,
        capabilities: &'a HashSet<String>,
    ) -> impl Iterator<Item = &'a String> + 'a {
        self.resources
            .iter()
            .filter(move |(_, caps)| capabilities.is_subset(caps))
            .map(|(id, _)| id)
    }

    pub fn from_xml_str(xml: &str) -> Result<Self> {
        let parsed: LandscapeXml = quick_xml::de::from_str(xml)?;
        let mut resources = HashMap::new();
        for resource in parsed.resources {
            let capabilities = resource.capabilities.into_iter().collect();
            if resources.insert(resource.id.clone(), capabilities).is_some() {
                return Err(PolicyError::InvalidPolicyXml(format!(
                    "duplicate it-resource id '{}' in landscape",
                    resource.id
                )));
            }
        }
        Ok(Self { resources })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename = "landscape")]
struct LandscapeXml {
    #[serde(rename = "it-resource", default)]
    resources: Vec<ItResourceXml>,
}

#[derive(Debug, Deserialize)]
struct ItResourceXml {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "capability", default)]
    capabilities: Vec<String>,
}
