// # Shared Prefix State
//
// `PrefixState` behind an async `RwLock`, for when the event-processing task
// and management readers run concurrently.
//
// Each method takes the lock exactly once, so every read observes one
// internally consistent snapshot and mutations are serialized.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::filter::{ReceivedRouteDetail, ReceivedRouteFilter};
use crate::state::prefix_state::{ChangedPrefixes, PrefixDatabase, PrefixEntries, PrefixState};
use crate::traits::PrefixEvent;
use crate::types::{Prefix, PrefixEntry, SourceId};

/// Cloneable, lock-protected handle to a [`PrefixState`]
///
/// # Example
///
/// ```rust,no_run
/// use pfx_core::state::SharedPrefixState;
/// use pfx_core::types::{PrefixEntry, SourceId};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let state = SharedPrefixState::new();
///     let source = SourceId::new("nodeA", "area1");
///
///     let changed = state
///         .update_prefix(&source, "10.0.0.0/24".parse()?, PrefixEntry::default())
///         .await;
///     assert_eq!(changed.len(), 1);
///
///     let dbs = state.prefix_databases().await;
///     assert_eq!(dbs[&source].prefix_entries.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SharedPrefixState {
    inner: Arc<RwLock<PrefixState>>,
}

impl SharedPrefixState {
    /// Wrap an empty store with the default observer
    pub fn new() -> Self {
        Self::from_state(PrefixState::new())
    }

    /// Wrap an existing store
    pub fn from_state(state: PrefixState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn update_prefix(
        &self,
        source: &SourceId,
        prefix: Prefix,
        entry: PrefixEntry,
    ) -> ChangedPrefixes {
        self.inner.write().await.update_prefix(source, prefix, entry)
    }

    pub async fn delete_prefix(&self, source: &SourceId, prefix: &Prefix) -> ChangedPrefixes {
        self.inner.write().await.delete_prefix(source, prefix)
    }

    pub async fn apply(&self, event: PrefixEvent) -> ChangedPrefixes {
        self.inner.write().await.apply(event)
    }

    pub async fn prefix_databases(&self) -> BTreeMap<SourceId, PrefixDatabase> {
        self.inner.read().await.prefix_databases()
    }

    pub async fn received_routes_filtered(
        &self,
        filter: &ReceivedRouteFilter,
    ) -> Vec<ReceivedRouteDetail> {
        self.inner.read().await.received_routes_filtered(filter)
    }

    pub async fn has_conflict(&self, prefix: &Prefix) -> bool {
        self.inner.read().await.has_conflict(prefix)
    }

    /// Copy of the current advertisers of `prefix`
    pub async fn advertisers(&self, prefix: &Prefix) -> Option<PrefixEntries> {
        self.inner.read().await.advertisers(prefix).cloned()
    }

    /// Total number of stored advertisements
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether nothing is advertised
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Run a read-only closure against one consistent snapshot
    pub async fn read<R>(&self, f: impl FnOnce(&PrefixState) -> R) -> R {
        let guard = self.inner.read().await;
        f(&guard)
    }
}

impl Default for SharedPrefixState {
    fn default() -> Self {
        Self::new()
    }
}
