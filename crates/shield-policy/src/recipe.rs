//! Recipe library types (spec §3 `Recipe`, §4.2, §6 "Recipe XML").

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{PolicyError, Result};

/// A mitigation recipe template for a `(type, severity-range)` band.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename = "recipe")]
pub struct Recipe {
    pub name: String,
    pub action: String,
    #[serde(rename = "min-severity")]
    pub min_severity: u8,
    #[serde(rename = "max-severity")]
    pub max_severity: u8,
    pub r#type: String,
    #[serde(rename = "traffic-constraints")]
    pub traffic_constraints: Option<TrafficConstraints>,
    #[serde(rename = "object-constraints")]
    pub object_constraints: Option<ObjectConstraints>,
    pub filters: Option<Filters>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrafficConstraints {
    pub r#type: Option<String>,
    #[serde(rename = "max-connections")]
    pub max_connections: Option<u32>,
    #[serde(rename = "rate-limit")]
    pub rate_limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ObjectConstraints {
    #[serde(rename = "any-port", default)]
    pub any_port: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Filters {
    #[serde(rename = "@evaluation", default = "default_evaluation")]
    pub evaluation: Evaluation,
    /// Predicate tag -> value text, e.g. `inputBytes` -> `"1000"`. A recipe
    /// can carry several predicates of different tags; each is dispatched to
    /// the registered filter plug-in whose tag matches (spec §4.2 step 4).
    #[serde(flatten)]
    pub predicates: BTreeMap<String, String>,
}

fn default_evaluation() -> Evaluation {
    Evaluation::Or
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Evaluation {
    And,
    Or,
}

impl Recipe {
    /// Whether this recipe applies to `(attack_type, severity)` (spec §4.2
    /// step 2).
    pub fn matches(&self, attack_type: &str, severity: u8) -> bool {
        self.r#type == attack_type && severity >= self.min_severity && severity <= self.max_severity
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_severity == 0 || self.min_severity > 4 || self.max_severity > 4 {
            return Err(PolicyError::InvalidPolicyXml(format!(
                "recipe '{}' has an out-of-range severity band [{},{}]",
                self.name, self.min_severity, self.max_severity
            )));
        }
        if self.min_severity > self.max_severity {
            return Err(PolicyError::InvalidPolicyXml(format!(
                "recipe '{}' has min-severity > max-severity",
                self.name
            )));
        }
        Ok(())
    }
}

/// A recipe-set file: one top-level grouping that a directory loader reads
/// and schema-validates as a unit, yielding its child `<recipe>` elements.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename = "recipe-set")]
pub struct RecipeSet {
    #[serde(rename = "recipe", default)]
    pub recipes: Vec<Recipe>,
}

impl RecipeSet {
    pub fn from_xml_str(xml: &str) -> Result<Self> {
        let set: RecipeSet = quick_xml::de::from_str(xml)?;
        for recipe in &set.recipes {
            recipe.validate()?;
        }
        Ok(set)
    }
}
