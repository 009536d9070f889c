// # pfx-core
//
// Prefix advertisement state for link-state route computation.
//
// ## Architecture Overview
//
// - **Prefix / SourceId / PrefixEntry**: immutable value types
// - **PrefixState**: forward and reverse advertisement indices, mutated only
//   through `update_prefix` / `delete_prefix`, each returning the exact set
//   of prefixes whose effective state changed
// - **filter**: received-route queries for the management surface
// - **conflict**: detects advertisers disagreeing on forwarding info
// - **PrefixEngine**: drives a PrefixEventSource into the store and hands
//   changed sets to RouteComputation
// - **SourceRegistry**: plugin-based registry for event sources
//
// ## Design Principles
//
// 1. **Total operations**: every store call succeeds; "nothing happened" is
//    an empty changed set, never an error
// 2. **Precise change signal**: no-op updates and unknown withdrawals report
//    nothing, so downstream recomputation stays incremental
// 3. **Detect, don't resolve**: conflicts are reported, never fixed up
// 4. **Library-First**: the daemon is a thin wrapper around this crate

pub mod config;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod filter;
pub mod registry;
pub mod state;
pub mod traits;
pub mod types;

// Re-export core types for convenience
pub use config::{EngineConfig, EventSourceConfig, PfxConfig, StoreConfig};
pub use conflict::has_conflicting_forwarding_info;
pub use engine::{EngineEvent, PrefixEngine};
pub use error::{Error, Result};
pub use filter::{ReceivedRoute, ReceivedRouteDetail, ReceivedRouteFilter};
pub use registry::SourceRegistry;
pub use state::{ChangedPrefixes, PrefixDatabase, PrefixEntries, PrefixState, SharedPrefixState};
pub use traits::{PrefixEvent, PrefixEventSource, RouteComputation};
pub use types::{
    ForwardingAlgorithm, ForwardingType, Prefix, PrefixEntry, PrefixKey, PrefixMetrics,
    PrefixType, SourceId,
};
