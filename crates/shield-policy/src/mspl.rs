//! MSPL projection output types (spec §3 `MSPL`, §4.4 [MSPL PROJECTOR],
//! §6 "MSPL XML"), grounded in `mspl.py::getMSPLs` and the `createFiltering*`
//! helpers the original's `ActionPlugin` base class exposes to its subclasses.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MsplContext {
    pub severity: u8,
    pub r#type: String,
    pub timestamp: DateTime<Utc>,
    /// Free string passed through from the source [`crate::Attack`] (spec §3:
    /// "passed through to MSPL context"). Unlike [`crate::HsplContext`], whose
    /// context fields are exactly `{severity, type, timestamp}`, the MSPL
    /// context carries this extra label through to the enforcer.
    pub anomaly_name: String,
}

/// One concrete packet-filter or rate-limit rule bound to an IT resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteringRule {
    pub priority: u32,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(rename = "source-address", skip_serializing_if = "Option::is_none")]
    pub source_address: Option<String>,
    #[serde(rename = "source-port", skip_serializing_if = "Option::is_none")]
    pub source_port: Option<String>,
    #[serde(rename = "destination-address", skip_serializing_if = "Option::is_none")]
    pub destination_address: Option<String>,
    #[serde(rename = "destination-port", skip_serializing_if = "Option::is_none")]
    pub destination_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(rename = "max-connections", skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(rename = "rate-limit", skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<String>,
}

/// Parameters for a single filtering rule, passed to
/// [`FilteringConfiguration::add_rule`]. Mirrors the keyword arguments the
/// original's `createFilteringRule` helper accepts.
#[derive(Debug, Clone, Default)]
pub struct RuleSpec {
    pub direction: Option<String>,
    pub source_address: Option<String>,
    pub source_port: Option<String>,
    pub destination_address: Option<String>,
    pub destination_port: Option<String>,
    pub protocol: Option<String>,
    pub max_connections: Option<u32>,
    pub rate_limit: Option<String>,
}

/// A packet-filter configuration for one IT resource: a default action plus
/// an ordered rule list (First-Matching-Rule semantics, spec §3: "FMR").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteringConfiguration {
    #[serde(rename = "default-action")]
    pub default_action: String,
    #[serde(rename = "resolution-strategy")]
    pub resolution_strategy: String,
    #[serde(rename = "rule", default)]
    pub rules: Vec<FilteringRule>,
}

impl FilteringConfiguration {
    /// `resolution_strategy` is always `"FMR"` (first matching rule) in this
    /// port, matching every call site in the original plug-ins.
    pub fn new(default_action: impl Into<String>) -> Self {
        Self {
            default_action: default_action.into(),
            resolution_strategy: "FMR".to_string(),
            rules: Vec::new(),
        }
    }

    pub fn add_rule(&mut self, priority: u32, action: impl Into<String>, spec: RuleSpec) {
        self.rules.push(FilteringRule {
            priority,
            action: action.into(),
            direction: spec.direction,
            source_address: spec.source_address,
            source_port: spec.source_port,
            destination_address: spec.destination_address,
            destination_port: spec.destination_port,
            protocol: spec.protocol,
            max_connections: spec.max_connections,
            rate_limit: spec.rate_limit,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItResource {
    #[serde(rename = "@id")]
    pub id: String,
    pub configuration: FilteringConfiguration,
}

/// The refined output bound to a single enforcement node (spec §3:
/// "MSPLSet: a context plus one IT resource").
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename = "mspl-set")]
pub struct MsplSet {
    pub context: MsplContext,
    #[serde(rename = "it-resource")]
    pub it_resource: ItResource,
}
