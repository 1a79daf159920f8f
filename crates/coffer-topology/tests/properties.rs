//! Property-based tests for naming, rule ordering and policy minimality.

use std::collections::HashSet;

use coffer_topology::{assemble, audit, resolve, ReplicationResource, TargetEnvironment};
use proptest::prelude::*;

const REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "eu-west-1",
    "eu-central-1",
    "ap-south-1",
    "ap-southeast-2",
    "sa-east-1",
];

fn env() -> TargetEnvironment {
    TargetEnvironment::new("123456789012", "us-east-1").unwrap()
}

fn prefix() -> impl Strategy<Value = String> {
    "[a-z0-9]([a-z0-9-]{0,8}[a-z0-9])?"
}

fn regions() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(REGIONS.to_vec(), 0..=REGIONS.len()).prop_shuffle()
}

proptest! {
    /// Resolution depends only on its inputs.
    #[test]
    fn prop_resolve_is_deterministic(prefix in prefix(), region in prop::sample::select(REGIONS)) {
        for kind in [ReplicationResource::Bucket, ReplicationResource::KeyAlias] {
            let a = resolve(&prefix, &env(), region, kind).unwrap();
            let b = resolve(&prefix, &env(), region, kind).unwrap();
            prop_assert_eq!(a, b);
        }
    }

    /// Assembling twice gives the same topology.
    #[test]
    fn prop_assemble_is_deterministic(prefix in prefix(), regions in regions()) {
        let a = assemble(&prefix, &env(), &regions).unwrap();
        let b = assemble(&prefix, &env(), &regions).unwrap();
        prop_assert_eq!(a, b);
    }

    /// N unique regions give N rules, priorities 0..N in input order.
    #[test]
    fn prop_rules_follow_input_order(regions in regions()) {
        let topology = assemble("archive", &env(), &regions).unwrap();
        let rules = topology.rules();

        prop_assert_eq!(rules.len(), regions.len());
        let priorities: HashSet<_> = rules.iter().map(|r| r.priority).collect();
        prop_assert_eq!(priorities.len(), regions.len());
        for (i, (rule, region)) in rules.iter().zip(&regions).enumerate() {
            prop_assert_eq!(rule.priority as usize, i);
            prop_assert_eq!(rule.id.as_str(), *region);
        }
    }

    /// Every actor statement is needed for some capability.
    #[test]
    fn prop_actor_statements_are_minimal(regions in regions()) {
        prop_assume!(!regions.is_empty());
        let topology = assemble("archive", &env(), &regions).unwrap();
        let required = topology.required_capabilities();
        let actor = topology.actor_statements();

        prop_assert!(audit(actor, &required).is_satisfied());
        for i in 0..actor.len() {
            prop_assert!(!audit(&actor.without(i), &required).is_satisfied());
        }
    }

    /// A region missing from the input is not referenced anywhere.
    #[test]
    fn prop_removed_region_leaves_no_trace(regions in regions()) {
        prop_assume!(regions.len() >= 2);
        let (kept, removed) = regions.split_at(regions.len() - 1);
        let topology = assemble("archive", &env(), kept).unwrap();

        let bucket = resolve("archive", &env(), removed[0], ReplicationResource::Bucket).unwrap();
        let key = resolve("archive", &env(), removed[0], ReplicationResource::KeyAlias).unwrap();
        for stmt in topology.actor_statements() {
            prop_assert!(!stmt.references(bucket.arn()));
            prop_assert!(!stmt.references(&bucket.objects_arn()));
            prop_assert!(!stmt.references(key.arn()));
        }
        prop_assert!(topology.rules().iter().all(|r| r.id != removed[0]));
    }
}
