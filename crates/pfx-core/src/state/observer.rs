// # Store Observers
//
// Every `PrefixState` owns one observer and reports each effective
// advertise/withdraw transition to it. No-op updates and withdrawals of
// unknown advertisements are never reported.
//
// Observers are a diagnostic side channel. Nothing they do can influence the
// changed-prefix sets returned by the store.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::types::{Prefix, PrefixEntry, SourceId};

/// Hook receiving the store's effective transitions
pub trait PrefixStateObserver: Send + Sync {
    /// A new or modified advertisement was stored
    fn on_advertise(&self, source: &SourceId, prefix: &Prefix, entry: &PrefixEntry);

    /// A stored advertisement was removed
    fn on_withdraw(&self, source: &SourceId, prefix: &Prefix);
}

/// Logs transitions through `tracing` at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PrefixStateObserver for TracingObserver {
    fn on_advertise(&self, source: &SourceId, prefix: &Prefix, entry: &PrefixEntry) {
        debug!(
            area = %source.area,
            node = %source.node_name,
            %prefix,
            forwarding_algorithm = ?entry.forwarding_algorithm,
            forwarding_type = ?entry.forwarding_type,
            "[ROUTE ADVERTISEMENT]"
        );
    }

    fn on_withdraw(&self, source: &SourceId, prefix: &Prefix) {
        debug!(
            area = %source.area,
            node = %source.node_name,
            %prefix,
            "[ROUTE WITHDRAW]"
        );
    }
}

/// Discards all transitions
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PrefixStateObserver for NoopObserver {
    fn on_advertise(&self, _source: &SourceId, _prefix: &Prefix, _entry: &PrefixEntry) {}

    fn on_withdraw(&self, _source: &SourceId, _prefix: &Prefix) {}
}

/// Owned form of a store transition, as delivered by [`ChannelObserver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixStateEvent {
    Advertised {
        source: SourceId,
        prefix: Prefix,
        entry: PrefixEntry,
    },
    Withdrawn {
        source: SourceId,
        prefix: Prefix,
    },
}

/// Forwards transitions over a bounded channel
///
/// Never blocks the store: when the channel is full or closed the event is
/// dropped with a warning.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::Sender<PrefixStateEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiver its events arrive on
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PrefixStateEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    fn send(&self, event: PrefixStateEvent) {
        if self.tx.try_send(event).is_err() {
            warn!("Observer channel full or closed, dropping prefix state event");
        }
    }
}

impl PrefixStateObserver for ChannelObserver {
    fn on_advertise(&self, source: &SourceId, prefix: &Prefix, entry: &PrefixEntry) {
        self.send(PrefixStateEvent::Advertised {
            source: source.clone(),
            prefix: *prefix,
            entry: entry.clone(),
        });
    }

    fn on_withdraw(&self, source: &SourceId, prefix: &Prefix) {
        self.send(PrefixStateEvent::Withdrawn {
            source: source.clone(),
            prefix: *prefix,
        });
    }
}
