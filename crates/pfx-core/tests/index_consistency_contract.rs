//! Contract Test: Index Consistency
//!
//! Random advertise/withdraw sequences are replayed against both the store
//! and a flat reference model.
//!
//! Constraints verified:
//! - `p ∈ reverse[s] ⇔ s ∈ forward[p]` after every operation
//! - No index key ever maps to an empty bucket
//! - Each changed set is exactly what the model predicts
//! - Conflict detection depends only on the multiset of forwarding info

use pfx_core::{
    ChangedPrefixes, ForwardingAlgorithm, ForwardingType, Prefix, PrefixEntries, PrefixEntry,
    PrefixState, SourceId, has_conflicting_forwarding_info,
};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
enum Op {
    Update {
        source: SourceId,
        prefix: Prefix,
        entry: PrefixEntry,
    },
    Delete {
        source: SourceId,
        prefix: Prefix,
    },
}

fn algorithm() -> impl Strategy<Value = ForwardingAlgorithm> {
    prop_oneof![
        Just(ForwardingAlgorithm::SpEcmp),
        Just(ForwardingAlgorithm::Ksp2EdEcmp),
        Just(ForwardingAlgorithm::SpUcmp),
    ]
}

fn forwarding_type() -> impl Strategy<Value = ForwardingType> {
    prop_oneof![Just(ForwardingType::Ip), Just(ForwardingType::SrMpls)]
}

fn source() -> impl Strategy<Value = SourceId> {
    (0..3u8, 0..2u8).prop_map(|(n, a)| SourceId::new(format!("node{n}"), format!("area{a}")))
}

fn prefix() -> impl Strategy<Value = Prefix> {
    (0..4u8).prop_map(|i| format!("10.0.{i}.0/24").parse::<Prefix>().unwrap())
}

fn entry() -> impl Strategy<Value = PrefixEntry> {
    (algorithm(), forwarding_type(), any::<bool>()).prop_map(|(algo, fwd_type, tagged)| {
        let entry = PrefixEntry::new(algo, fwd_type);
        if tagged { entry.with_tag("tagged") } else { entry }
    })
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (source(), prefix(), entry())
            .prop_map(|(source, prefix, entry)| Op::Update { source, prefix, entry }),
        2 => (source(), prefix()).prop_map(|(source, prefix)| Op::Delete { source, prefix }),
    ]
}

fn assert_indices_consistent(state: &PrefixState) {
    let mut forward_pairs = BTreeSet::new();
    for (prefix, entries) in state.prefixes() {
        assert!(!entries.is_empty(), "forward index has empty bucket for {prefix}");
        for source in entries.keys() {
            forward_pairs.insert((source.clone(), *prefix));
        }
    }

    let mut reverse_pairs = BTreeSet::new();
    for (source, db) in state.prefix_databases() {
        let advertised = state
            .prefixes_of(&source)
            .expect("snapshot only lists known sources");
        assert!(!advertised.is_empty(), "reverse index has empty bucket for {source}");
        assert_eq!(advertised.len(), db.prefix_entries.len());
        for prefix in advertised {
            reverse_pairs.insert((source.clone(), *prefix));
        }
    }

    assert_eq!(forward_pairs, reverse_pairs);
}

proptest! {
    #[test]
    fn indices_stay_symmetric_and_changes_are_precise(ops in prop::collection::vec(op(), 0..64)) {
        let mut state = PrefixState::new();
        let mut model: BTreeMap<(SourceId, Prefix), PrefixEntry> = BTreeMap::new();

        for op in ops {
            let (changed, expected) = match op {
                Op::Update { source, prefix, entry } => {
                    let expected = match model.insert((source.clone(), prefix), entry.clone()) {
                        Some(previous) if previous == entry => ChangedPrefixes::new(),
                        _ => ChangedPrefixes::from([prefix]),
                    };
                    (state.update_prefix(&source, prefix, entry), expected)
                }
                Op::Delete { source, prefix } => {
                    let expected = match model.remove(&(source.clone(), prefix)) {
                        Some(_) => ChangedPrefixes::from([prefix]),
                        None => ChangedPrefixes::new(),
                    };
                    (state.delete_prefix(&source, &prefix), expected)
                }
            };

            prop_assert_eq!(changed, expected);
            assert_indices_consistent(&state);
            prop_assert_eq!(state.len(), model.len());
        }

        for ((source, prefix), entry) in &model {
            let stored = state.advertisers(prefix).and_then(|e| e.get(source));
            prop_assert_eq!(stored, Some(entry));
        }
    }

    #[test]
    fn update_then_identical_update_reports_nothing(
        source in source(),
        prefix in prefix(),
        entry in entry()
    ) {
        let mut state = PrefixState::new();
        prop_assert_eq!(
            state.update_prefix(&source, prefix, entry.clone()),
            ChangedPrefixes::from([prefix])
        );
        prop_assert!(state.update_prefix(&source, prefix, entry).is_empty());
    }

    #[test]
    fn conflict_depends_only_on_forwarding_info_multiset(
        (infos, shuffled) in prop::collection::vec((algorithm(), forwarding_type()), 0..8)
            .prop_flat_map(|infos| (Just(infos.clone()), Just(infos).prop_shuffle()))
    ) {
        let build = |infos: &[(ForwardingAlgorithm, ForwardingType)]| -> PrefixEntries {
            infos
                .iter()
                .enumerate()
                .map(|(i, (algo, fwd_type))| {
                    (SourceId::new(format!("node{i}"), "area0"), PrefixEntry::new(*algo, *fwd_type))
                })
                .collect()
        };

        let distinct: BTreeSet<String> = infos.iter().map(|info| format!("{info:?}")).collect();
        let expected = distinct.len() > 1;

        prop_assert_eq!(has_conflicting_forwarding_info(&build(&infos)), expected);
        prop_assert_eq!(has_conflicting_forwarding_info(&build(&shuffled)), expected);
    }
}
