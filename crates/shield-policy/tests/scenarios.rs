//! Literal end-to-end scenarios from spec §8, exercised against the public
//! `shield-policy` API (recipe parsing, HSPL synthesis, optimization).

use chrono::{DateTime, Utc};
use ipnet::Contains;
use shield_policy::{optimize, Attack, AttackEvent, OptimizeConfig, RecipeSet};

fn t(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn recipe_set(xml: &str) -> RecipeSet {
    RecipeSet::from_xml_str(xml).unwrap()
}

/// Scenario 1: very high DoS over TCP ⇒ two HSPLs, both `action=drop,
/// traffic-constraints.type=TCP`.
#[test]
fn very_high_dos_over_tcp_yields_two_drop_hspls() {
    let recipes = recipe_set(
        r#"<recipe-set><recipe>
            <name>drop-dos</name>
            <action>drop</action>
            <min-severity>3</min-severity>
            <max-severity>4</max-severity>
            <type>DoS</type>
            <traffic-constraints><type>TCP</type></traffic-constraints>
        </recipe></recipe-set>"#,
    );
    let recipe = &recipes.recipes[0];

    let mut attack = Attack::new(4, "DoS", Some(1));
    attack
        .events
        .push(AttackEvent::new(t("2026-01-01T00:00:00Z"), "1.2.3.4:1000", "10.0.0.1:80"));
    attack
        .events
        .push(AttackEvent::new(t("2026-01-01T00:00:01Z"), "1.2.3.5:1001", "10.0.0.1:80"));

    let mut set = shield_policy::hspl::synthesize(&attack, recipe, |_, _, _| true).unwrap();
    assert_eq!(set.hspls.len(), 2);
    for hspl in &set.hspls {
        assert_eq!(hspl.action, "drop");
        assert_eq!(hspl.traffic_constraints.r#type, "TCP");
    }

    // No optimizer changes expected: distinct subjects/objects, nothing to merge.
    let stats = optimize(&mut set, OptimizeConfig::default());
    assert_eq!(stats.included_removed, 0);
    assert_eq!(stats.any_port_merged, 0);
    assert_eq!(stats.subnet_merged, 0);
    assert_eq!(set.hspls.len(), 2);
}

/// Scenario 3: DNS tunneling with a `TCP+UDP` recipe type emits the combined
/// type string on the HSPL (MSPL-side expansion into two rules is covered by
/// `shield-core`'s action plug-in tests).
#[test]
fn dns_tunneling_recipe_emits_combined_tcp_udp_type() {
    let recipes = recipe_set(
        r#"<recipe-set><recipe>
            <name>drop-dns-tunneling</name>
            <action>drop</action>
            <min-severity>1</min-severity>
            <max-severity>4</max-severity>
            <type>DNS tunneling</type>
            <traffic-constraints><type>TCP+UDP</type></traffic-constraints>
        </recipe></recipe-set>"#,
    );
    let recipe = &recipes.recipes[0];

    let mut attack = Attack::new(4, "DNS tunneling", Some(1));
    attack
        .events
        .push(AttackEvent::new(t("2026-01-01T00:00:00Z"), "0.0.0.0/0:53", "10.0.0.1:53"));

    let set = shield_policy::hspl::synthesize(&attack, recipe, |_, _, _| true).unwrap();
    assert_eq!(set.hspls.len(), 1);
    assert_eq!(set.hspls[0].traffic_constraints.r#type, "TCP+UDP");
}

/// Scenario 4: 12 HSPLs with distinct ports on the same host, above
/// threshold 10, coalesce to a single any-port HSPL.
#[test]
fn any_port_merging_collapses_distinct_ports_on_one_host() {
    let recipes = recipe_set(
        r#"<recipe-set><recipe>
            <name>drop-dos</name>
            <action>drop</action>
            <min-severity>3</min-severity>
            <max-severity>4</max-severity>
            <type>DoS</type>
            <traffic-constraints><type>TCP</type></traffic-constraints>
        </recipe></recipe-set>"#,
    );
    let recipe = &recipes.recipes[0];

    let mut attack = Attack::new(4, "DoS", Some(1));
    for port in 1000..1012u16 {
        attack.events.push(AttackEvent::new(
            t("2026-01-01T00:00:00Z"),
            format!("91.211.1.100:{port}"),
            "10.0.0.1:80",
        ));
    }

    let mut set = shield_policy::hspl::synthesize(&attack, recipe, |_, _, _| true).unwrap();
    assert_eq!(set.hspls.len(), 12);

    let config = OptimizeConfig {
        merging_threshold: 10,
        merging_min_bits: 2,
        merging_max_bits: 8,
    };
    let stats = optimize(&mut set, config);
    assert_eq!(stats.any_port_merged, 11);
    assert_eq!(set.hspls.len(), 1);
    assert_eq!(set.hspls[0].object, "91.211.1.100:*");
}

/// Scenario 5: 12 HSPLs on 91.211.1.0..11 with an any-port recipe constraint
/// subnet-merge down to six `/31:*` HSPLs.
#[test]
fn subnet_merging_collapses_a_contiguous_host_range_to_slash_31_pairs() {
    let recipes = recipe_set(
        r#"<recipe-set><recipe>
            <name>drop-dos</name>
            <action>drop</action>
            <min-severity>3</min-severity>
            <max-severity>4</max-severity>
            <type>DoS</type>
            <traffic-constraints><type>TCP</type></traffic-constraints>
            <object-constraints><any-port>true</any-port></object-constraints>
        </recipe></recipe-set>"#,
    );
    let recipe = &recipes.recipes[0];

    let mut attack = Attack::new(4, "DoS", Some(1));
    for host in 0..12u8 {
        attack.events.push(AttackEvent::new(
            t("2026-01-01T00:00:00Z"),
            format!("91.211.1.{host}:{}", 2000 + u16::from(host)),
            "10.0.0.1:80",
        ));
    }

    let mut set = shield_policy::hspl::synthesize(&attack, recipe, |_, _, _| true).unwrap();
    assert_eq!(set.hspls.len(), 12);
    assert!(set.hspls.iter().all(|h| h.object.ends_with(":*")));

    let config = OptimizeConfig {
        merging_threshold: 10,
        merging_min_bits: 1,
        merging_max_bits: 8,
    };
    let stats = optimize(&mut set, config);
    assert_eq!(set.hspls.len(), 6);
    assert_eq!(stats.subnet_merged, 6);
    for hspl in &set.hspls {
        assert!(hspl.object.ends_with("/31:*"), "unexpected object {}", hspl.object);
    }
}

/// Idempotence (spec §8 invariant 4): optimizing an already-optimized set
/// leaves it unchanged.
#[test]
fn optimizing_twice_is_idempotent() {
    let recipes = recipe_set(
        r#"<recipe-set><recipe>
            <name>drop-dos</name>
            <action>drop</action>
            <min-severity>3</min-severity>
            <max-severity>4</max-severity>
            <type>DoS</type>
            <traffic-constraints><type>TCP</type></traffic-constraints>
        </recipe></recipe-set>"#,
    );
    let recipe = &recipes.recipes[0];

    let mut attack = Attack::new(4, "DoS", Some(1));
    for port in 1000..1012u16 {
        attack.events.push(AttackEvent::new(
            t("2026-01-01T00:00:00Z"),
            format!("91.211.1.100:{port}"),
            "10.0.0.1:80",
        ));
    }

    let mut set = shield_policy::hspl::synthesize(&attack, recipe, |_, _, _| true).unwrap();
    let config = OptimizeConfig {
        merging_threshold: 10,
        merging_min_bits: 2,
        merging_max_bits: 8,
    };
    optimize(&mut set, config);
    let once_optimized = set.clone();
    let stats = optimize(&mut set, config);
    assert_eq!(set, once_optimized);
    assert_eq!(stats.included_removed, 0);
    assert_eq!(stats.any_port_merged, 0);
    assert_eq!(stats.subnet_merged, 0);
}

/// Boundary behavior: a single event yields exactly one HSPL and the
/// optimizer makes no changes to it.
#[test]
fn single_event_yields_one_hspl_untouched_by_the_optimizer() {
    let recipes = recipe_set(
        r#"<recipe-set><recipe>
            <name>drop-dos</name>
            <action>drop</action>
            <min-severity>3</min-severity>
            <max-severity>4</max-severity>
            <type>DoS</type>
            <traffic-constraints><type>TCP</type></traffic-constraints>
        </recipe></recipe-set>"#,
    );
    let recipe = &recipes.recipes[0];

    let mut attack = Attack::new(4, "DoS", Some(1));
    attack
        .events
        .push(AttackEvent::new(t("2026-01-01T00:00:00Z"), "1.2.3.4:1111", "10.0.0.1:80"));

    let mut set = shield_policy::hspl::synthesize(&attack, recipe, |_, _, _| true).unwrap();
    assert_eq!(set.hspls.len(), 1);
    let stats = optimize(&mut set, OptimizeConfig::default());
    assert_eq!(stats.final_count, 1);
    assert_eq!(set.hspls.len(), 1);
}

/// Boundary behavior: an empty event stream yields no HSPL set and no error.
#[test]
fn empty_event_stream_yields_no_hspls_and_no_error() {
    let recipes = recipe_set(
        r#"<recipe-set><recipe>
            <name>drop-dos</name><action>drop</action>
            <min-severity>3</min-severity><max-severity>4</max-severity><type>DoS</type>
        </recipe></recipe-set>"#,
    );
    let recipe = &recipes.recipes[0];
    let attack = Attack::new(4, "DoS", Some(1));
    assert!(shield_policy::hspl::synthesize(&attack, recipe, |_, _, _| true).is_none());
}

/// Boundary behavior: a bare address and its `/32` form behave identically.
#[test]
fn prefix_32_addresses_behave_like_bare_addresses() {
    let bare = shield_policy::endpoint::parse("10.0.0.1:80").unwrap();
    let slash32 = shield_policy::endpoint::parse("10.0.0.1/32:80").unwrap();
    assert_eq!(bare.net, slash32.net);
    assert_eq!(bare.port, slash32.port);
}

/// Invariant 2 (spec §8): every HSPL in a synthesized set carries the
/// recipe's own action, never a mix.
#[test]
fn every_hspl_carries_the_recipes_action() {
    let recipes = recipe_set(
        r#"<recipe-set><recipe>
            <name>limit-dos</name>
            <action>limit</action>
            <min-severity>1</min-severity>
            <max-severity>4</max-severity>
            <type>DoS</type>
        </recipe></recipe-set>"#,
    );
    let recipe = &recipes.recipes[0];

    let mut attack = Attack::new(4, "DoS", Some(1));
    for port in 1000..1005u16 {
        attack.events.push(AttackEvent::new(
            t("2026-01-01T00:00:00Z"),
            format!("1.2.3.{}:{port}", port % 4),
            "10.0.0.1:80",
        ));
    }

    let set = shield_policy::hspl::synthesize(&attack, recipe, |_, _, _| true).unwrap();
    assert!(!set.hspls.is_empty());
    assert!(set.hspls.iter().all(|h| h.action == recipe.action));
}

/// Invariant 3 (spec §8 over-approximation): every flow covered by an HSPL
/// before optimization is still covered by some HSPL after it. Sampled over
/// the exact (address, port) pairs used to synthesize the any-port scenario.
#[test]
fn optimized_set_still_covers_every_original_flow() {
    let recipes = recipe_set(
        r#"<recipe-set><recipe>
            <name>drop-dos</name>
            <action>drop</action>
            <min-severity>3</min-severity>
            <max-severity>4</max-severity>
            <type>DoS</type>
            <traffic-constraints><type>TCP</type></traffic-constraints>
        </recipe></recipe-set>"#,
    );
    let recipe = &recipes.recipes[0];

    let mut attack = Attack::new(4, "DoS", Some(1));
    let mut flows = Vec::new();
    for port in 1000..1012u16 {
        let addr = "91.211.1.100".to_string();
        attack.events.push(AttackEvent::new(
            t("2026-01-01T00:00:00Z"),
            format!("{addr}:{port}"),
            "10.0.0.1:80",
        ));
        flows.push((addr, port));
    }

    let mut set = shield_policy::hspl::synthesize(&attack, recipe, |_, _, _| true).unwrap();
    let config = OptimizeConfig {
        merging_threshold: 10,
        merging_min_bits: 2,
        merging_max_bits: 8,
    };
    optimize(&mut set, config);

    for (addr, port) in flows {
        let flow = shield_policy::endpoint::parse(&format!("{addr}:{port}")).unwrap();
        let covered = set.hspls.iter().any(|h| {
            h.subject == "10.0.0.1:80"
                && h.action == "drop"
                && shield_policy::endpoint::parse(&h.object)
                    .is_some_and(|o| o.net.contains(&flow.net) && o.port.covers(flow.port))
        });
        assert!(covered, "flow {addr}:{port} is no longer covered after optimization");
    }
}

/// Invariant 6 (spec §8 determinism): two synthesis+optimize runs over
/// identical input produce byte-identical HSPL XML (the projector's random
/// plug-in choice is outside this invariant's scope).
#[test]
fn synthesis_and_optimization_are_deterministic() {
    let recipes = recipe_set(
        r#"<recipe-set><recipe>
            <name>drop-dos</name>
            <action>drop</action>
            <min-severity>3</min-severity>
            <max-severity>4</max-severity>
            <type>DoS</type>
            <traffic-constraints><type>TCP</type></traffic-constraints>
            <object-constraints><any-port>true</any-port></object-constraints>
        </recipe></recipe-set>"#,
    );
    let recipe = &recipes.recipes[0];

    let build_attack = || {
        let mut attack = Attack::new(4, "DoS", Some(1));
        for host in 0..12u8 {
            attack.events.push(AttackEvent::new(
                t("2026-01-01T00:00:00Z"),
                format!("91.211.1.{host}:{}", 2000 + u16::from(host)),
                "10.0.0.1:80",
            ));
        }
        attack
    };
    let config = OptimizeConfig {
        merging_threshold: 10,
        merging_min_bits: 1,
        merging_max_bits: 8,
    };

    let mut first = shield_policy::hspl::synthesize(&build_attack(), recipe, |_, _, _| true).unwrap();
    optimize(&mut first, config);
    let mut second = shield_policy::hspl::synthesize(&build_attack(), recipe, |_, _, _| true).unwrap();
    optimize(&mut second, config);

    let first_xml = quick_xml::se::to_string(&first).unwrap();
    let second_xml = quick_xml::se::to_string(&second).unwrap();
    assert_eq!(first_xml, second_xml);
}

/// Invariant 5 (spec §8 confluence): re-running the optimizer over an
/// already-optimized, reordered copy of the same HSPLs converges to the
/// same multiset of surviving objects regardless of input order.
#[test]
fn optimizer_result_does_not_depend_on_input_order() {
    let recipes = recipe_set(
        r#"<recipe-set><recipe>
            <name>drop-dos</name>
            <action>drop</action>
            <min-severity>3</min-severity>
            <max-severity>4</max-severity>
            <type>DoS</type>
            <traffic-constraints><type>TCP</type></traffic-constraints>
        </recipe></recipe-set>"#,
    );
    let recipe = &recipes.recipes[0];

    let mut attack = Attack::new(4, "DoS", Some(1));
    for port in 1000..1012u16 {
        attack.events.push(AttackEvent::new(
            t("2026-01-01T00:00:00Z"),
            format!("91.211.1.100:{port}"),
            "10.0.0.1:80",
        ));
    }

    let config = OptimizeConfig {
        merging_threshold: 10,
        merging_min_bits: 2,
        merging_max_bits: 8,
    };

    let mut forward = shield_policy::hspl::synthesize(&attack, recipe, |_, _, _| true).unwrap();
    optimize(&mut forward, config);

    attack.events.reverse();
    let mut reversed = shield_policy::hspl::synthesize(&attack, recipe, |_, _, _| true).unwrap();
    optimize(&mut reversed, config);

    let mut forward_objects: Vec<&str> = forward.hspls.iter().map(|h| h.object.as_str()).collect();
    let mut reversed_objects: Vec<&str> = reversed.hspls.iter().map(|h| h.object.as_str()).collect();
    forward_objects.sort_unstable();
    reversed_objects.sort_unstable();
    assert_eq!(forward_objects, reversed_objects);
}
