//! The HSPL set-algebra optimizer (spec §4.3 [HSPL OPTIMIZER]).
//!
//! Ported from `hspl.py::__cleanAndMerge`/`__buildMap`/`__findInclusions`/
//! `__checkIncludedHSPLs`: inclusion elimination via an index keyed by
//! subject+action+constraints and the HSPL object's own masked address
//! bytes, then two coalescing passes that widen surviving objects to an
//! any-port or wider-subnet form when doing so still includes every HSPL it
//! absorbs.

use std::collections::HashMap;
use std::time::Instant;

use ipnet::Contains;

use crate::endpoint::{self, Ipv4Object, Port};
use crate::hspl::{Hspl, HsplSet, HsplTrafficConstraints};

/// Tunables for the coalescing passes (spec §6:
/// `hsplMergingThreshold`/`hsplMergingMinBits`/`hsplMergingMaxBits`).
#[derive(Debug, Clone, Copy)]
pub struct OptimizeConfig {
    pub merging_threshold: usize,
    pub merging_min_bits: u8,
    pub merging_max_bits: u8,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            merging_threshold: 32,
            merging_min_bits: 2,
            merging_max_bits: 8,
        }
    }
}

/// Counts of HSPLs removed by each pass, for logging (spec §4.3: "log how
/// many HSPLs each pass removed").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    pub initial_count: usize,
    pub included_removed: usize,
    pub any_port_merged: usize,
    pub subnet_merged: usize,
    pub final_count: usize,
}

type GroupKey = (String, String, HsplTrafficConstraints);

fn group_key(hspl: &Hspl) -> GroupKey {
    (
        hspl.subject.clone(),
        hspl.action.clone(),
        hspl.traffic_constraints.clone(),
    )
}

/// Whether `hspl1` includes `hspl2`: same subject/action/traffic-constraints
/// and `hspl2`'s object falls within `hspl1`'s object subnet and port
/// (spec §4.3 inclusion predicate, `hspl.py::__checkIncludedHSPLs`).
fn includes(hspl1: &Hspl, hspl2: &Hspl) -> bool {
    if hspl1.subject != hspl2.subject
        || hspl1.action != hspl2.action
        || hspl1.traffic_constraints != hspl2.traffic_constraints
    {
        return false;
    }
    let (Some(object1), Some(object2)) = (endpoint::parse(&hspl1.object), endpoint::parse(&hspl2.object)) else {
        return false;
    };
    object1.net.contains(&object2.net) && object1.port.covers(object2.port)
}

/// Builds the inclusion index: group by subject+action+constraints, then by
/// the object's own network address bytes (its masking prefix applied to
/// itself, matching the original's per-HSPL map key exactly).
fn build_index(hspls: &[Hspl]) -> HashMap<GroupKey, HashMap<[u8; 4], Vec<usize>>> {
    let mut index: HashMap<GroupKey, HashMap<[u8; 4], Vec<usize>>> = HashMap::new();
    for (i, hspl) in hspls.iter().enumerate() {
        let Some(object) = endpoint::parse(&hspl.object) else {
            continue;
        };
        index
            .entry(group_key(hspl))
            .or_default()
            .entry(object.net.network().octets())
            .or_default()
            .push(i);
    }
    index
}

fn find_inclusions(hspls: &[Hspl]) -> Vec<usize> {
    let start = Instant::now();
    let index = build_index(hspls);
    let mut included = std::collections::HashSet::new();
    for (i, hspl) in hspls.iter().enumerate() {
        let Some(object) = endpoint::parse(&hspl.object) else {
            continue;
        };
        let Some(bucket) = index
            .get(&group_key(hspl))
            .and_then(|by_bytes| by_bytes.get(&object.net.network().octets()))
        else {
            continue;
        };
        for &j in bucket {
            if i != j && !included.contains(&i) && !included.contains(&j) && includes(hspl, &hspls[j]) {
                included.insert(j);
            }
        }
    }
    tracing::debug!(elapsed = ?start.elapsed(), removed = included.len(), "inclusion pass complete");
    included.into_iter().collect()
}

fn widened_object(object: &Ipv4Object, port: Port) -> String {
    format!("{}:{}", object.net.addr(), port)
}

/// Pass 2: widens an object's port to `*` when doing so still includes
/// every other surviving HSPL it absorbs (spec §4.3 Pass 2).
fn merge_any_port(hspls: &mut Vec<Hspl>) -> usize {
    let mut merged = std::collections::HashSet::new();
    let len = hspls.len();
    for i in 0..len.saturating_sub(1) {
        let Some(object1) = endpoint::parse(&hspls[i].object) else {
            continue;
        };
        let candidate = widened_object(&object1, Port::Any);
        let mut widened = hspls[i].clone();
        widened.object = candidate.clone();
        let mut absorbed_any = false;
        for j in (i + 1)..len {
            if merged.contains(&j) {
                continue;
            }
            if includes(&widened, &hspls[j]) {
                merged.insert(j);
                absorbed_any = true;
            }
        }
        if absorbed_any {
            hspls[i].object = candidate;
        }
    }
    let removed = merged.len();
    let mut sorted: Vec<usize> = merged.into_iter().collect();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    for index in sorted {
        hspls.remove(index);
    }
    removed
}

/// Pass 3: widens surviving objects' subnet from `merging_min_bits` towards
/// `merging_max_bits` host bits until the HSPL count drops at or below the
/// merging threshold (spec §4.3 Pass 3).
fn merge_subnets(hspls: &mut Vec<Hspl>, config: OptimizeConfig) -> usize {
    let mut merged = std::collections::HashSet::new();
    let mut host_bits = config.merging_min_bits;
    while hspls.len() - merged.len() > config.merging_threshold && host_bits <= config.merging_max_bits {
        let prefix_len = 32 - host_bits;
        let len = hspls.len();
        for i in 0..len.saturating_sub(1) {
            let Some(object1) = endpoint::parse(&hspls[i].object) else {
                continue;
            };
            let Ok(widened_net) = format!("{}/{}", object1.net.addr(), prefix_len).parse::<ipnet::Ipv4Net>() else {
                continue;
            };
            let widened_net = widened_net.trunc();
            let candidate = format!("{}/{}:{}", widened_net.network(), widened_net.prefix_len(), object1.port);
            let mut widened = hspls[i].clone();
            widened.object = candidate.clone();
            let mut absorbed_any = false;
            for j in (i + 1)..len {
                if merged.contains(&j) {
                    continue;
                }
                if includes(&widened, &hspls[j]) {
                    merged.insert(j);
                    absorbed_any = true;
                }
            }
            if absorbed_any {
                hspls[i].object = candidate;
            }
        }
        host_bits += 1;
    }
    let removed = merged.len();
    let mut merged_sorted: Vec<usize> = merged.into_iter().collect();
    merged_sorted.sort_unstable_by(|a, b| b.cmp(a));
    for index in merged_sorted {
        hspls.remove(index);
    }
    removed
}

/// Runs the full three-pass optimizer over `hspl_set.hspls` in place.
pub fn optimize(hspl_set: &mut HsplSet, config: OptimizeConfig) -> OptimizeStats {
    let initial_count = hspl_set.hspls.len();
    tracing::info!(count = initial_count, "initial HSPLs generated");

    let mut included_sorted = find_inclusions(&hspl_set.hspls);
    let included_removed = included_sorted.len();
    included_sorted.sort_unstable_by(|a, b| b.cmp(a));
    for index in included_sorted {
        hspl_set.hspls.remove(index);
    }
    if included_removed > 0 {
        tracing::debug!(count = included_removed, "included HSPLs removed");
    }

    let any_port_merged = if hspl_set.hspls.len() > config.merging_threshold {
        let merged_count = merge_any_port(&mut hspl_set.hspls);
        if merged_count > 0 {
            tracing::debug!(count = merged_count, "HSPLs merged using any port");
        }
        merged_count
    } else {
        0
    };

    let subnet_merged = merge_subnets(&mut hspl_set.hspls, config);
    if subnet_merged > 0 {
        tracing::debug!(count = subnet_merged, "HSPLs merged using subnets");
    }

    let final_count = hspl_set.hspls.len();
    tracing::info!(count = final_count, "HSPLs remaining");

    OptimizeStats {
        initial_count,
        included_removed,
        any_port_merged,
        subnet_merged,
        final_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hspl::HsplContext;
    use chrono::Utc;

    fn hspl(subject: &str, object: &str) -> Hspl {
        Hspl {
            name: "t".to_string(),
            subject: subject.to_string(),
            action: "drop".to_string(),
            object: object.to_string(),
            traffic_constraints: HsplTrafficConstraints {
                r#type: "TCP".to_string(),
                max_connections: None,
                rate_limit: None,
            },
        }
    }

    fn set(hspls: Vec<Hspl>) -> HsplSet {
        HsplSet {
            context: HsplContext {
                severity: 4,
                r#type: "DoS".to_string(),
                timestamp: Utc::now(),
            },
            hspls,
        }
    }

    #[test]
    fn removes_duplicate_and_included_hspls() {
        let mut s = set(vec![
            hspl("10.0.0.1:80", "1.2.3.0/24:*"),
            hspl("10.0.0.1:80", "1.2.3.4:80"),
        ]);
        let stats = optimize(&mut s, OptimizeConfig::default());
        assert_eq!(stats.included_removed, 1);
        assert_eq!(s.hspls.len(), 1);
        assert_eq!(s.hspls[0].object, "1.2.3.0/24:*");
    }

    #[test]
    fn unrelated_hspls_are_left_alone() {
        let mut s = set(vec![hspl("10.0.0.1:80", "1.2.3.4:80"), hspl("10.0.0.2:80", "5.6.7.8:80")]);
        let stats = optimize(&mut s, OptimizeConfig::default());
        assert_eq!(stats.included_removed, 0);
        assert_eq!(s.hspls.len(), 2);
    }

    #[test]
    fn any_port_merge_runs_above_threshold() {
        let config = OptimizeConfig {
            merging_threshold: 1,
            merging_min_bits: 2,
            merging_max_bits: 8,
        };
        let mut s = set(vec![
            hspl("10.0.0.1:80", "1.2.3.4:80"),
            hspl("10.0.0.1:80", "1.2.3.4:443"),
        ]);
        let stats = optimize(&mut s, config);
        assert_eq!(stats.any_port_merged, 1);
        assert_eq!(s.hspls.len(), 1);
        assert_eq!(s.hspls[0].object, "1.2.3.4:*");
    }
}
