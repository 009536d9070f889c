// # Prefix Event Source Trait
//
// Defines the interface through which the distribution layer delivers
// advertise/withdraw events.
//
// ## Implementations
//
// - JSON-lines replay: `pfx-source-file` crate
// - Future: a live link-state database subscription
//
// ## Usage
//
// ```rust,ignore
// use pfx_core::PrefixEventSource;
// use tokio_stream::StreamExt;
//
// let source = /* PrefixEventSource implementation */;
// let mut events = source.watch();
// while let Some(event) = events.next().await {
//     let changed = state.apply(event);
// }
// ```

use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

use crate::types::{PrefixEntry, PrefixKey};

/// One advertise or withdraw event from the distribution layer
///
/// Serialized form:
///
/// ```json
/// {"op":"advertise","key":"prefix:nodeA:area1:[10.0.0.0/24]","entry":{"forwarding_algorithm":"sp_ecmp"}}
/// {"op":"withdraw","key":"prefix:nodeA:area1:[10.0.0.0/24]"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PrefixEvent {
    /// A source advertises (or re-advertises) a prefix
    Advertise { key: PrefixKey, entry: PrefixEntry },

    /// A source withdraws a prefix
    Withdraw { key: PrefixKey },
}

impl PrefixEvent {
    /// The key this event refers to
    pub fn key(&self) -> &PrefixKey {
        match self {
            PrefixEvent::Advertise { key, .. } | PrefixEvent::Withdraw { key } => key,
        }
    }
}

/// Trait for prefix event source implementations
///
/// Sources only deliver events. They never touch the store and never decide
/// what must be recomputed.
pub trait PrefixEventSource: Send + Sync {
    /// Stream of events, in the order the distribution layer produced them
    ///
    /// A finite source ends the stream when exhausted. Must be
    /// cancellation-safe: dropping the stream releases its resources.
    fn watch(&self) -> Pin<Box<dyn Stream<Item = PrefixEvent> + Send + 'static>>;

    /// Human-readable name for logs
    fn source_name(&self) -> &str;
}

/// Helper trait for constructing event sources from configuration
pub trait PrefixEventSourceFactory: Send + Sync {
    /// Create a PrefixEventSource instance from configuration
    fn create(
        &self,
        config: &crate::config::EventSourceConfig,
    ) -> Result<Box<dyn PrefixEventSource>, crate::Error>;
}
