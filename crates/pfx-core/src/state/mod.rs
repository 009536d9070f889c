// # Prefix State
//
// The advertisement store, its observer hook, and a lock-protected handle
// for concurrent use.

pub mod observer;
pub mod prefix_state;
pub mod shared;

pub use observer::{
    ChannelObserver, NoopObserver, PrefixStateEvent, PrefixStateObserver, TracingObserver,
};
pub use prefix_state::{ChangedPrefixes, PrefixDatabase, PrefixEntries, PrefixState};
pub use shared::SharedPrefixState;
