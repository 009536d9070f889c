//! Received-route queries for the management surface
//!
//! Selects stored advertisements by prefix, node and area, and shapes them
//! into per-prefix [`ReceivedRouteDetail`] records.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::state::PrefixEntries;
use crate::types::{Prefix, PrefixEntry, SourceId};

/// Filter for [`crate::PrefixState::received_routes_filtered`]
///
/// Every unset field matches anything. A set field matches exactly, so
/// `node_name: Some("")` only matches a node with an empty name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedRouteFilter {
    /// Only these prefixes (unknown prefixes contribute nothing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefixes: Option<BTreeSet<Prefix>>,

    /// Only advertisements from this node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,

    /// Only advertisements received in this area
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_name: Option<String>,
}

impl ReceivedRouteFilter {
    /// A filter matching everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to the given prefixes
    pub fn with_prefixes(mut self, prefixes: impl IntoIterator<Item = Prefix>) -> Self {
        self.prefixes = Some(prefixes.into_iter().collect());
        self
    }

    /// Restrict to one node
    pub fn with_node_name(mut self, node_name: impl Into<String>) -> Self {
        self.node_name = Some(node_name.into());
        self
    }

    /// Restrict to one area
    pub fn with_area_name(mut self, area_name: impl Into<String>) -> Self {
        self.area_name = Some(area_name.into());
        self
    }

    /// Whether an advertiser passes the node and area constraints
    pub fn matches_source(&self, source: &SourceId) -> bool {
        if let Some(node_name) = &self.node_name
            && *node_name != source.node_name
        {
            return false;
        }
        if let Some(area_name) = &self.area_name
            && *area_name != source.area
        {
            return false;
        }
        true
    }
}

/// One advertiser's view of a prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedRoute {
    pub source: SourceId,
    pub entry: PrefixEntry,
}

/// All surviving advertisements of one prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedRouteDetail {
    pub prefix: Prefix,
    /// Never empty
    pub routes: Vec<ReceivedRoute>,
}

/// Apply `filter` to a forward index
///
/// Output follows the index's prefix order, and advertiser order within
/// each prefix. Prefixes left without any advertiser are omitted.
pub fn filter_received_routes(
    prefixes: &BTreeMap<Prefix, PrefixEntries>,
    filter: &ReceivedRouteFilter,
) -> Vec<ReceivedRouteDetail> {
    match &filter.prefixes {
        Some(wanted) => wanted
            .iter()
            .filter_map(|prefix| prefixes.get_key_value(prefix))
            .filter_map(|(prefix, entries)| route_detail(filter, prefix, entries))
            .collect(),
        None => prefixes
            .iter()
            .filter_map(|(prefix, entries)| route_detail(filter, prefix, entries))
            .collect(),
    }
}

fn route_detail(
    filter: &ReceivedRouteFilter,
    prefix: &Prefix,
    entries: &PrefixEntries,
) -> Option<ReceivedRouteDetail> {
    let routes: Vec<ReceivedRoute> = entries
        .iter()
        .filter(|(source, _)| filter.matches_source(source))
        .map(|(source, entry)| ReceivedRoute {
            source: source.clone(),
            entry: entry.clone(),
        })
        .collect();

    if routes.is_empty() {
        return None;
    }

    Some(ReceivedRouteDetail {
        prefix: *prefix,
        routes,
    })
}
