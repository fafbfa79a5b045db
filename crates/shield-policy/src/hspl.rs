//! HSPL synthesis (spec §3 `HSPL`, §4.2 [HSPL SYNTHESIZER], §6 "HSPL XML").

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::endpoint;
use crate::model::{Attack, AttackEvent};
use crate::recipe::{Evaluation, Recipe};

/// One abstract `(subject, action, object, traffic-constraints)` policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename = "hspl")]
pub struct Hspl {
    pub name: String,
    pub subject: String,
    pub action: String,
    pub object: String,
    #[serde(rename = "traffic-constraints")]
    pub traffic_constraints: HsplTrafficConstraints,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HsplTrafficConstraints {
    pub r#type: String,
    #[serde(rename = "max-connections", skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(rename = "rate-limit", skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HsplContext {
    pub severity: u8,
    pub r#type: String,
    pub timestamp: DateTime<Utc>,
}

/// The refined output of a single attack: a context plus zero or more HSPLs
/// (spec §3: "HSPLSet: a context plus a list of HSPLs").
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename = "hspl-set")]
pub struct HsplSet {
    pub context: HsplContext,
    #[serde(rename = "hspl", default)]
    pub hspls: Vec<Hspl>,
}

/// Evaluates a recipe's `<filters>` against one event using the supplied
/// per-predicate-tag test function, combining results with the declared
/// `and`/`or` evaluation (spec §4.2 step 4, grounded on `hspl.py::getHSPLs`'s
/// filter loop). `test(tag, value, event)` is expected to look up the
/// registered filter plug-in for `tag` and apply it; an unknown tag should
/// return `false` for `or` filters not to short-circuit surprisingly.
fn event_passes_filters(
    recipe: &Recipe,
    event: &AttackEvent,
    test: &mut dyn FnMut(&str, &str, &AttackEvent) -> bool,
) -> bool {
    let Some(filters) = &recipe.filters else {
        return true;
    };
    if filters.predicates.is_empty() {
        return matches!(filters.evaluation, Evaluation::And);
    }
    match filters.evaluation {
        Evaluation::Or => filters
            .predicates
            .iter()
            .any(|(tag, value)| test(tag, value, event)),
        Evaluation::And => filters
            .predicates
            .iter()
            .all(|(tag, value)| test(tag, value, event)),
    }
}

/// Rewrites an `ADDR[/PREFIX]:PORT` object to its any-port form when the
/// recipe sets `object-constraints/any-port` (spec §4.2: "object = `event.
/// attacker`, optionally rewritten to `ADDR:*`..."). Non-IPv4 (opaque)
/// objects are left untouched, same as the optimizer's own parse-or-skip rule.
fn rewrite_any_port(object: &str) -> String {
    match endpoint::parse(object) {
        Some(parsed) if parsed.net.prefix_len() == 32 => endpoint::render_any_port(parsed.net.addr()),
        Some(parsed) => endpoint::render_subnet_any_port(parsed.net),
        None => object.to_string(),
    }
}

/// Synthesizes the HSPL set that mitigates `attack` using `recipe` (spec
/// §4.2 steps 4-5). Callers supply `filter_test` to dispatch registered
/// filter plug-ins and `default_protocol` to resolve `traffic-constraints`
/// when the recipe leaves the protocol unspecified (falls back to the
/// event's own `protocol` field, as in the original reasoner).
pub fn synthesize(
    attack: &Attack,
    recipe: &Recipe,
    mut filter_test: impl FnMut(&str, &str, &AttackEvent) -> bool,
) -> Option<HsplSet> {
    let timestamp = attack.timestamp()?;

    let events: Vec<&AttackEvent> = attack
        .events
        .iter()
        .filter(|event| event_passes_filters(recipe, event, &mut filter_test))
        .collect();

    let traffic = recipe.traffic_constraints.as_ref();
    let recipe_type = traffic.and_then(|t| t.r#type.clone());
    let max_connections = traffic.and_then(|t| t.max_connections);
    let rate_limit = traffic.and_then(|t| t.rate_limit.clone());
    let any_port = recipe.object_constraints.is_some_and(|c| c.any_port);

    let mut hspls = Vec::with_capacity(events.len());
    for (index, event) in events.into_iter().enumerate() {
        let event_type = recipe_type
            .clone()
            .or_else(|| event.protocol().map(str::to_owned))
            .unwrap_or_default();
        let carries_max_connections = event_type == "TCP" && max_connections.is_some();
        let object = if any_port {
            rewrite_any_port(&event.attacker)
        } else {
            event.attacker.clone()
        };
        hspls.push(Hspl {
            name: format!("{} #{}", recipe.name, index + 1),
            subject: event.target.clone(),
            action: recipe.action.clone(),
            object,
            traffic_constraints: HsplTrafficConstraints {
                r#type: event_type,
                max_connections: carries_max_connections.then_some(max_connections).flatten(),
                rate_limit: rate_limit.clone(),
            },
        });
    }

    Some(HsplSet {
        context: HsplContext {
            severity: attack.severity,
            r#type: attack.r#type.clone(),
            timestamp,
        },
        hspls,
    })
}
