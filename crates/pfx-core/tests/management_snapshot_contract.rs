//! Contract Test: Management Snapshots
//!
//! Verifies the read-only surface used for introspection: per-source prefix
//! databases, filtered received routes and conflict reporting.

mod common;

use common::*;
use pfx_core::{
    ChangedPrefixes, ForwardingAlgorithm, ForwardingType, PrefixEntry, PrefixState,
    ReceivedRouteFilter, SourceId, has_conflicting_forwarding_info,
};

#[test]
fn repeated_advertisement_changes_nothing() {
    let mut state = PrefixState::new();
    let source = SourceId::new("nodeA", "area1");
    let e1 = entry(ForwardingAlgorithm::SpEcmp);

    assert_eq!(
        state.update_prefix(&source, prefix("10.0.0.0/24"), e1.clone()),
        ChangedPrefixes::from([prefix("10.0.0.0/24")])
    );
    assert!(state.update_prefix(&source, prefix("10.0.0.0/24"), e1).is_empty());
}

#[test]
fn differing_algorithms_conflict() {
    let mut state = PrefixState::new();
    state.update_prefix(
        &SourceId::new("nodeA", "area1"),
        prefix("10.0.0.0/24"),
        entry(ForwardingAlgorithm::SpEcmp),
    );
    state.update_prefix(
        &SourceId::new("nodeB", "area1"),
        prefix("10.0.0.0/24"),
        entry(ForwardingAlgorithm::Ksp2EdEcmp),
    );

    let advertisers = state.advertisers(&prefix("10.0.0.0/24")).unwrap();
    assert!(has_conflicting_forwarding_info(advertisers));
}

#[test]
fn withdrawn_prefix_leaves_snapshot() {
    let mut state = PrefixState::new();
    let source = SourceId::new("nodeA", "area1");
    let p = prefix("10.0.0.0/24");

    state.update_prefix(&source, p, entry(ForwardingAlgorithm::SpEcmp));
    assert_eq!(state.delete_prefix(&source, &p), ChangedPrefixes::from([p]));
    assert!(state.delete_prefix(&source, &p).is_empty());

    let dbs = state.prefix_databases();
    assert!(
        dbs.get(&source)
            .is_none_or(|db| !db.prefix_entries.contains_key(&p))
    );
    assert!(dbs.is_empty());
}

#[test]
fn same_node_in_two_areas_yields_two_databases() {
    let mut state = PrefixState::new();
    let p = prefix("10.0.0.0/24");
    let area1 = SourceId::new("nodeA", "area1");
    let area2 = SourceId::new("nodeA", "area2");

    state.update_prefix(&area1, p, entry(ForwardingAlgorithm::SpEcmp));
    state.update_prefix(&area2, p, entry(ForwardingAlgorithm::SpEcmp));

    let dbs = state.prefix_databases();
    assert_eq!(dbs.len(), 2);
    for source in [&area1, &area2] {
        let db = &dbs[source];
        assert_eq!(db.node_name, "nodeA");
        assert_eq!(db.area, source.area);
        assert_eq!(db.prefix_entries.len(), 1);
        assert!(db.prefix_entries.contains_key(&p));
    }
}

#[test]
fn snapshot_carries_stored_entries() {
    let mut state = PrefixState::new();
    let source = SourceId::new("nodeA", "area1");
    let rich = PrefixEntry::new(ForwardingAlgorithm::SpUcmp, ForwardingType::SrMpls)
        .with_weight(10)
        .with_tag("65000:100")
        .with_area_stack(vec!["area0".to_string()]);

    state.update_prefix(&source, prefix("fc00::/64"), rich.clone());
    state.update_prefix(&source, prefix("10.0.0.0/24"), PrefixEntry::default());

    let db = &state.prefix_databases()[&source];
    assert_eq!(db.prefix_entries.len(), 2);
    assert_eq!(db.prefix_entries[&prefix("fc00::/64")], rich);
}

#[test]
fn filter_by_node_restricts_every_route() {
    let mut state = PrefixState::new();
    let e = entry(ForwardingAlgorithm::SpEcmp);
    for (node, area, p) in [
        ("nodeA", "area1", "10.0.0.0/24"),
        ("nodeB", "area1", "10.0.0.0/24"),
        ("nodeA", "area2", "10.0.1.0/24"),
        ("nodeB", "area2", "10.0.2.0/24"),
    ] {
        state.update_prefix(&SourceId::new(node, area), prefix(p), e.clone());
    }

    let details =
        state.received_routes_filtered(&ReceivedRouteFilter::new().with_node_name("nodeA"));
    assert_eq!(details.len(), 2);
    assert!(
        details
            .iter()
            .flat_map(|d| &d.routes)
            .all(|r| r.source.node_name == "nodeA")
    );

    let details = state.received_routes_filtered(
        &ReceivedRouteFilter::new()
            .with_prefixes([prefix("10.0.0.0/24"), prefix("172.16.0.0/12")])
            .with_area_name("area1"),
    );
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].prefix, prefix("10.0.0.0/24"));
    assert_eq!(details[0].routes.len(), 2);

    let details = state.received_routes_filtered(
        &ReceivedRouteFilter::new().with_prefixes([prefix("192.168.0.0/16")]),
    );
    assert!(details.is_empty());
}

#[test]
fn snapshots_serialize_for_management_surface() {
    let mut state = PrefixState::new();
    state.update_prefix(
        &SourceId::new("nodeA", "area1"),
        prefix("10.0.0.0/24"),
        entry(ForwardingAlgorithm::SpEcmp),
    );

    let details = state.received_routes_filtered(&ReceivedRouteFilter::new());
    let json = serde_json::to_value(&details).unwrap();
    assert_eq!(json[0]["prefix"], "10.0.0.0/24");
    assert_eq!(json[0]["routes"][0]["source"]["node_name"], "nodeA");
    assert_eq!(json[0]["routes"][0]["entry"]["forwarding_algorithm"], "sp_ecmp");
}
