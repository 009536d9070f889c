// # Prefix State
//
// The authoritative in-memory index of which sources advertise which
// prefixes.
//
// ## Indices
//
// - forward: prefix -> { source -> entry }
// - reverse: source -> { prefix }
//
// `p ∈ reverse[s]` holds exactly when `s ∈ forward[p]`, and no key in
// either index ever maps to an empty bucket. Both indices are private and
// only `update_prefix` / `delete_prefix` mutate them.
//
// ## Concurrency
//
// Not internally synchronized; a single writer is expected. Use
// `SharedPrefixState` when readers and the writer live on different tasks.

use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use crate::config::StoreConfig;
use crate::conflict::has_conflicting_forwarding_info;
use crate::filter::{ReceivedRouteDetail, ReceivedRouteFilter, filter_received_routes};
use crate::state::observer::{NoopObserver, PrefixStateObserver, TracingObserver};
use crate::traits::PrefixEvent;
use crate::types::{Prefix, PrefixEntry, SourceId};

/// All current advertisers of one prefix
pub type PrefixEntries = BTreeMap<SourceId, PrefixEntry>;

/// Prefixes whose effective state changed in one mutation
///
/// Route computation recomputes exactly these and nothing else.
pub type ChangedPrefixes = HashSet<Prefix>;

/// Everything one source currently advertises
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixDatabase {
    pub node_name: String,
    pub area: String,
    pub prefix_entries: BTreeMap<Prefix, PrefixEntry>,
}

/// Prefix advertisement store
pub struct PrefixState {
    prefixes: BTreeMap<Prefix, PrefixEntries>,
    node_to_prefixes: BTreeMap<SourceId, BTreeSet<Prefix>>,
    observer: Box<dyn PrefixStateObserver>,
}

impl PrefixState {
    /// Create an empty store that logs transitions through `tracing`
    pub fn new() -> Self {
        Self::with_observer(Box::new(TracingObserver))
    }

    /// Create an empty store reporting transitions to `observer`
    pub fn with_observer(observer: Box<dyn PrefixStateObserver>) -> Self {
        Self {
            prefixes: BTreeMap::new(),
            node_to_prefixes: BTreeMap::new(),
            observer,
        }
    }

    /// Create an empty store from configuration
    pub fn from_config(config: &StoreConfig) -> Self {
        if config.log_advertisements {
            Self::new()
        } else {
            Self::with_observer(Box::new(NoopObserver))
        }
    }

    /// Store `entry` as `source`'s advertisement of `prefix`
    ///
    /// Returns `{prefix}` when the advertisement is new or differs from the
    /// stored one, and an empty set when it is identical.
    pub fn update_prefix(
        &mut self,
        source: &SourceId,
        prefix: Prefix,
        entry: PrefixEntry,
    ) -> ChangedPrefixes {
        let mut changed = ChangedPrefixes::new();

        let entries = self.prefixes.entry(prefix).or_default();
        match entries.entry(source.clone()) {
            Entry::Occupied(mut stored) => {
                if *stored.get() == entry {
                    return changed;
                }
                stored.insert(entry);
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
                self.node_to_prefixes
                    .entry(source.clone())
                    .or_default()
                    .insert(prefix);
            }
        }
        changed.insert(prefix);

        if let Some(stored) = self.prefixes.get(&prefix).and_then(|e| e.get(source)) {
            self.observer.on_advertise(source, &prefix, stored);
        }
        changed
    }

    /// Remove `source`'s advertisement of `prefix`
    ///
    /// Returns `{prefix}` when something was removed, otherwise an empty set.
    pub fn delete_prefix(&mut self, source: &SourceId, prefix: &Prefix) -> ChangedPrefixes {
        let mut changed = ChangedPrefixes::new();

        let Some(advertised) = self.node_to_prefixes.get_mut(source) else {
            return changed;
        };
        if !advertised.remove(prefix) {
            return changed;
        }
        if advertised.is_empty() {
            self.node_to_prefixes.remove(source);
        }

        if let Some(entries) = self.prefixes.get_mut(prefix) {
            entries.remove(source);
            if entries.is_empty() {
                self.prefixes.remove(prefix);
            }
        }

        changed.insert(*prefix);
        self.observer.on_withdraw(source, prefix);
        changed
    }

    /// Apply one distribution-layer event
    pub fn apply(&mut self, event: PrefixEvent) -> ChangedPrefixes {
        match event {
            PrefixEvent::Advertise { key, entry } => {
                self.update_prefix(&key.source_id(), key.prefix(), entry)
            }
            PrefixEvent::Withdraw { key } => self.delete_prefix(&key.source_id(), &key.prefix()),
        }
    }

    /// Snapshot of every source's advertisements
    pub fn prefix_databases(&self) -> BTreeMap<SourceId, PrefixDatabase> {
        self.node_to_prefixes
            .iter()
            .map(|(source, advertised)| {
                let prefix_entries = advertised
                    .iter()
                    .filter_map(|prefix| {
                        self.prefixes
                            .get(prefix)
                            .and_then(|entries| entries.get(source))
                            .map(|entry| (*prefix, entry.clone()))
                    })
                    .collect();

                let db = PrefixDatabase {
                    node_name: source.node_name.clone(),
                    area: source.area.clone(),
                    prefix_entries,
                };
                (source.clone(), db)
            })
            .collect()
    }

    /// Stored advertisements matching `filter`
    pub fn received_routes_filtered(
        &self,
        filter: &ReceivedRouteFilter,
    ) -> Vec<ReceivedRouteDetail> {
        filter_received_routes(&self.prefixes, filter)
    }

    /// Whether the advertisers of `prefix` disagree on forwarding info
    ///
    /// Unknown prefixes have no advertisers and therefore no conflict.
    pub fn has_conflict(&self, prefix: &Prefix) -> bool {
        self.prefixes
            .get(prefix)
            .is_some_and(has_conflicting_forwarding_info)
    }

    /// Read-only view of the forward index
    pub fn prefixes(&self) -> &BTreeMap<Prefix, PrefixEntries> {
        &self.prefixes
    }

    /// Current advertisers of `prefix`
    pub fn advertisers(&self, prefix: &Prefix) -> Option<&PrefixEntries> {
        self.prefixes.get(prefix)
    }

    /// Prefixes currently advertised by `source`
    pub fn prefixes_of(&self, source: &SourceId) -> Option<&BTreeSet<Prefix>> {
        self.node_to_prefixes.get(source)
    }

    /// Number of known sources
    pub fn source_count(&self) -> usize {
        self.node_to_prefixes.len()
    }

    /// Total number of stored advertisements
    pub fn len(&self) -> usize {
        self.prefixes.values().map(BTreeMap::len).sum()
    }

    /// Whether nothing is advertised
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

impl Default for PrefixState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PrefixState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefixState")
            .field("prefixes", &self.prefixes)
            .field("node_to_prefixes", &self.node_to_prefixes)
            .finish_non_exhaustive()
    }
}
