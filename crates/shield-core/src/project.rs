//! MSPL projection (spec §4.4 [MSPL PROJECTOR]), grounded in
//! `mspl.py::getMSPLs`/`__findLocation`.

use rand::Rng;
use shield_policy::{HsplSet, ItResource, MsplContext, MsplSet};

use crate::config::LimitConfig;
use crate::error::{Result, ShieldError};
use crate::registry::{ActionPlugin, Registry};
use crate::resolver::NodeResolver;

/// Picks an `(action plug-in, node-id)` pair uniformly at random among
/// eligible pairs, resolves the node id, and delegates rule construction.
/// Per spec §4.4 step 1, *random* selection is intentional (load-shedding);
/// this port makes it a function of an injected `rand::Rng` so callers can
/// substitute a seeded RNG for reproducible tests (spec §9 redesign note).
pub fn project(
    hspl_set: &HsplSet,
    anomaly_name: &str,
    landscape: &shield_policy::Landscape,
    registry: &Registry,
    resolver: Option<&dyn NodeResolver>,
    limit_config: &LimitConfig,
    rng: &mut impl Rng,
) -> Result<MsplSet> {
    let Some(action) = hspl_set.hspls.first().map(|h| h.action.as_str()) else {
        return Err(ShieldError::NoEnforcer);
    };

    let eligible: Vec<(&dyn ActionPlugin, &String)> = registry
        .actions_for(action)
        .flat_map(|plugin| {
            landscape
                .nodes_satisfying(plugin.capabilities())
                .map(move |node_id| (plugin, node_id))
        })
        .collect();

    if eligible.is_empty() {
        return Err(ShieldError::NoEnforcer);
    }

    let (plugin, node_id) = eligible[rng.gen_range(0..eligible.len())];

    let resolved_id = match resolver {
        Some(resolver) => resolver.resolve(node_id).unwrap_or_else(|| node_id.clone()),
        None => node_id.clone(),
    };

    let configuration = plugin.configure(hspl_set, limit_config);

    Ok(MsplSet {
        context: MsplContext {
            severity: hspl_set.context.severity,
            r#type: hspl_set.context.r#type.clone(),
            timestamp: hspl_set.context.timestamp,
            anomaly_name: anomaly_name.to_string(),
        },
        it_resource: ItResource {
            id: resolved_id,
            configuration,
        },
    })
}
