//! Built-in action plug-ins (spec §4.4), ported from
//! `original_source/cybertop/plugins/ActionDrop.py` and `plugins/limit.py`.

use std::collections::HashSet;

use shield_policy::{FilteringConfiguration, HsplSet, RuleSpec};

use crate::config::LimitConfig;
use crate::registry::ActionPlugin;

fn split_endpoint(endpoint: &str) -> (&str, &str) {
    endpoint.rsplit_once(':').unwrap_or((endpoint, "*"))
}

/// Default-accept, drops every HSPL's traffic (spec §4.4: "Drop").
pub struct DropAction {
    capabilities: HashSet<String>,
}

impl DropAction {
    pub fn new() -> Self {
        Self {
            capabilities: ["drop".to_string()].into_iter().collect(),
        }
    }
}

impl Default for DropAction {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionPlugin for DropAction {
    fn id(&self) -> &str {
        "Drop"
    }

    fn action(&self) -> &str {
        "drop"
    }

    fn capabilities(&self) -> &HashSet<String> {
        &self.capabilities
    }

    fn configure(&self, hspl_set: &HsplSet, _limit_config: &LimitConfig) -> FilteringConfiguration {
        let mut configuration = FilteringConfiguration::new("accept");
        let mut priority = 0u32;
        for hspl in &hspl_set.hspls {
            let (source_address, source_port) = split_endpoint(&hspl.object);
            let (destination_address, destination_port) = split_endpoint(&hspl.subject);
            let protocol = hspl.traffic_constraints.r#type.as_str();

            let mut rule = |protocol: &str| {
                priority += 1;
                configuration.add_rule(
                    priority,
                    "drop",
                    RuleSpec {
                        direction: Some("inbound".to_string()),
                        source_address: Some(source_address.to_string()),
                        source_port: Some(source_port.to_string()),
                        destination_address: Some(destination_address.to_string()),
                        destination_port: Some(destination_port.to_string()),
                        protocol: Some(protocol.to_string()),
                        ..Default::default()
                    },
                );
            };

            if protocol == "TCP+UDP" {
                rule("TCP");
                rule("UDP");
            } else {
                rule(protocol);
            }
        }
        configuration
    }
}

/// Default-drop, caps connections and rate-limits the rest (spec §4.4:
/// "Limit").
pub struct Limit {
    capabilities: HashSet<String>,
}

impl Limit {
    const FALLBACK_MAX_CONNECTIONS: u32 = 20;
    const FALLBACK_RATE_LIMIT: &'static str = "100kbit/s";

    pub fn new() -> Self {
        Self {
            capabilities: ["rate-limit".to_string()].into_iter().collect(),
        }
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionPlugin for Limit {
    fn id(&self) -> &str {
        "Limit"
    }

    fn action(&self) -> &str {
        "limit"
    }

    fn capabilities(&self) -> &HashSet<String> {
        &self.capabilities
    }

    fn configure(&self, hspl_set: &HsplSet, limit_config: &LimitConfig) -> FilteringConfiguration {
        let mut configuration = FilteringConfiguration::new("drop");
        let mut priority = 0u32;

        let fallback_max_connections = limit_config.max_connections.unwrap_or(Self::FALLBACK_MAX_CONNECTIONS);
        let fallback_rate_limit = limit_config.rate_limit.clone().unwrap_or_else(|| Self::FALLBACK_RATE_LIMIT.to_string());

        let has_tcp = hspl_set.hspls.iter().any(|h| h.traffic_constraints.r#type == "TCP");
        if has_tcp {
            priority += 1;
            configuration.add_rule(
                priority,
                "reject",
                RuleSpec {
                    direction: Some("inbound".to_string()),
                    protocol: Some("TCP".to_string()),
                    max_connections: Some(fallback_max_connections),
                    ..Default::default()
                },
            );
        }

        for hspl in &hspl_set.hspls {
            priority += 1;
            let (source_address, source_port) = split_endpoint(&hspl.object);
            let (destination_address, destination_port) = split_endpoint(&hspl.subject);
            let protocol = hspl.traffic_constraints.r#type.clone();
            let max_connections = (protocol == "TCP")
                .then(|| hspl.traffic_constraints.max_connections.unwrap_or(fallback_max_connections));
            let rate_limit = hspl
                .traffic_constraints
                .rate_limit
                .clone()
                .unwrap_or_else(|| fallback_rate_limit.clone());

            configuration.add_rule(
                priority,
                "accept",
                RuleSpec {
                    direction: Some("inbound".to_string()),
                    source_address: Some(source_address.to_string()),
                    source_port: Some(source_port.to_string()),
                    destination_address: Some(destination_address.to_string()),
                    destination_port: Some(destination_port.to_string()),
                    protocol: Some(protocol),
                    max_connections,
                    rate_limit: Some(rate_limit),
                },
            );
        }
        configuration
    }
}
