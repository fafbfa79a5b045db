//! Emit-once warning gating, grounded in `assay-metrics::policy_warning`'s
//! `OnceLock<Mutex<HashSet<K>>>` cache.

use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

fn warned_keys() -> &'static Mutex<HashSet<String>> {
    static CACHE: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashSet::new()))
}

fn should_warn_once_impl(key: &str) -> bool {
    let mut cache = warned_keys().lock().expect("warning cache mutex must not be poisoned");
    cache.insert(key.to_string())
}

/// Returns `true` the first time this key is seen, `false` on every
/// subsequent call, for the lifetime of the process.
pub fn should_warn_once(key: &str) -> bool {
    should_warn_once_impl(key)
}

/// A recipe references a filter tag with no registered `FilterPlugin`.
/// Logged once per (recipe name, tag) pair rather than once per event, since
/// a single mis-configured recipe would otherwise flood the log.
pub fn should_warn_unknown_filter_tag(recipe_name: &str, tag: &str) -> bool {
    should_warn_once(&format!("unknown-filter-tag:{recipe_name}:{tag}"))
}
