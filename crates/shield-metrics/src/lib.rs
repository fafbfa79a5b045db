//! Ambient instrumentation for the shield pipeline: process-wide counters
//! over the ingest/select/synthesize/optimize/project/publish stages, plus
//! emit-once warning gating for misconfiguration that would otherwise spam
//! the log once per event.

mod counters;
mod warnings;

pub use counters::{
    record_attack_ingested, record_attack_parse_failed, record_dashboard_publish,
    record_hspl_suppressed_by_filters, record_hspl_synthesized, record_mspl_no_enforcer,
    record_mspl_projected, record_optimizer_pass, record_recipe_matched, record_recipe_unmatched,
    snapshot, Snapshot,
};
pub use warnings::{should_warn_once, should_warn_unknown_filter_tag};
