// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for name matching
//!
//! `select_unique` must agree with a plain count of exact-name matches for
//! every listing.

use cosmo_sg_provisioner::domain::SecurityGroup;
use cosmo_sg_provisioner::errors::ProvisionerError;
use cosmo_sg_provisioner::locator::select_unique;
use proptest::prelude::*;

fn group_strategy() -> impl Strategy<Value = SecurityGroup> {
    (any::<u32>(), prop_oneof!["web", "db", "cache", "Web", "web "]).prop_map(|(id, name)| {
        SecurityGroup {
            id: id.to_string(),
            name,
            description: String::new(),
            rules: Vec::new(),
        }
    })
}

proptest! {
    #[test]
    fn prop_lookup_agrees_with_match_count(
        groups in prop::collection::vec(group_strategy(), 0..12),
        name in prop_oneof!["web", "db", "queue"],
    ) {
        let expected = groups.iter().filter(|g| g.name == name).count();
        let result = select_unique(groups.clone(), &name);

        match expected {
            0 => prop_assert_eq!(result.unwrap(), None),
            1 => {
                let found = result.unwrap().unwrap();
                prop_assert_eq!(&found.name, &name);
                prop_assert!(groups.contains(&found));
            }
            n => match result {
                Err(ProvisionerError::AmbiguousName { name: reported, count }) => {
                    prop_assert_eq!(reported, name);
                    prop_assert_eq!(count, n);
                }
                other => prop_assert!(false, "expected ambiguity, got {:?}", other),
            },
        }
    }
}
