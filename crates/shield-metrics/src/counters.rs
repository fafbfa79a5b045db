//! Process-wide pipeline counters, grounded in `assay-metrics`'s style of a
//! small set of free functions operating on a lazily-initialized global.
//! Unlike `assay-metrics`'s per-check `Metric` trait (this engine has no
//! equivalent pass/fail scoring concept), the counters here are plain
//! monotonic tallies over the attack-to-enforcement pipeline's stages.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use serde::Serialize;

#[derive(Default)]
struct Counters {
    attacks_ingested: AtomicU64,
    attacks_parse_failed: AtomicU64,
    recipes_matched: AtomicU64,
    recipes_unmatched: AtomicU64,
    hspl_synthesized: AtomicU64,
    hspl_suppressed_by_filters: AtomicU64,
    optimizer_inclusion_removed: AtomicU64,
    optimizer_any_port_merged: AtomicU64,
    optimizer_subnet_merged: AtomicU64,
    mspl_projected: AtomicU64,
    mspl_no_enforcer: AtomicU64,
    dashboard_publish_ok: AtomicU64,
    dashboard_publish_failed: AtomicU64,
}

fn counters() -> &'static Counters {
    static COUNTERS: OnceLock<Counters> = OnceLock::new();
    COUNTERS.get_or_init(Counters::default)
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

fn add(counter: &AtomicU64, n: u64) {
    if n > 0 {
        counter.fetch_add(n, Ordering::Relaxed);
    }
}

pub fn record_attack_ingested() {
    bump(&counters().attacks_ingested);
}

pub fn record_attack_parse_failed() {
    bump(&counters().attacks_parse_failed);
}

pub fn record_recipe_matched() {
    bump(&counters().recipes_matched);
}

pub fn record_recipe_unmatched() {
    bump(&counters().recipes_unmatched);
}

pub fn record_hspl_synthesized(count: u64) {
    add(&counters().hspl_synthesized, count);
}

pub fn record_hspl_suppressed_by_filters(count: u64) {
    add(&counters().hspl_suppressed_by_filters, count);
}

/// Folds one optimizer pass's tallies into the running totals. `shield-policy`'s
/// `optimize()` already returns these as a single `OptimizeStats` struct per
/// attack; callers pass its three merge counters through here verbatim.
pub fn record_optimizer_pass(inclusion_removed: u64, any_port_merged: u64, subnet_merged: u64) {
    add(&counters().optimizer_inclusion_removed, inclusion_removed);
    add(&counters().optimizer_any_port_merged, any_port_merged);
    add(&counters().optimizer_subnet_merged, subnet_merged);
}

pub fn record_mspl_projected() {
    bump(&counters().mspl_projected);
}

pub fn record_mspl_no_enforcer() {
    bump(&counters().mspl_no_enforcer);
}

pub fn record_dashboard_publish(success: bool) {
    if success {
        bump(&counters().dashboard_publish_ok);
    } else {
        bump(&counters().dashboard_publish_failed);
    }
}

/// A point-in-time snapshot of every counter, suitable for logging or for
/// a future `/metrics`-style endpoint.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Snapshot {
    pub attacks_ingested: u64,
    pub attacks_parse_failed: u64,
    pub recipes_matched: u64,
    pub recipes_unmatched: u64,
    pub hspl_synthesized: u64,
    pub hspl_suppressed_by_filters: u64,
    pub optimizer_inclusion_removed: u64,
    pub optimizer_any_port_merged: u64,
    pub optimizer_subnet_merged: u64,
    pub mspl_projected: u64,
    pub mspl_no_enforcer: u64,
    pub dashboard_publish_ok: u64,
    pub dashboard_publish_failed: u64,
}

pub fn snapshot() -> Snapshot {
    let c = counters();
    Snapshot {
        attacks_ingested: c.attacks_ingested.load(Ordering::Relaxed),
        attacks_parse_failed: c.attacks_parse_failed.load(Ordering::Relaxed),
        recipes_matched: c.recipes_matched.load(Ordering::Relaxed),
        recipes_unmatched: c.recipes_unmatched.load(Ordering::Relaxed),
        hspl_synthesized: c.hspl_synthesized.load(Ordering::Relaxed),
        hspl_suppressed_by_filters: c.hspl_suppressed_by_filters.load(Ordering::Relaxed),
        optimizer_inclusion_removed: c.optimizer_inclusion_removed.load(Ordering::Relaxed),
        optimizer_any_port_merged: c.optimizer_any_port_merged.load(Ordering::Relaxed),
        optimizer_subnet_merged: c.optimizer_subnet_merged.load(Ordering::Relaxed),
        mspl_projected: c.mspl_projected.load(Ordering::Relaxed),
        mspl_no_enforcer: c.mspl_no_enforcer.load(Ordering::Relaxed),
        dashboard_publish_ok: c.dashboard_publish_ok.load(Ordering::Relaxed),
        dashboard_publish_failed: c.dashboard_publish_failed.load(Ordering::Relaxed),
    }
}
