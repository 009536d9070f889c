//! Event-driven prefix engine
//!
//! The PrefixEngine is responsible for:
//! - Consuming advertise/withdraw events from a PrefixEventSource
//! - Applying each event to the shared prefix state
//! - Handing every non-empty changed-prefix set to RouteComputation
//! - Flagging prefixes whose advertisers disagree on forwarding info
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────┐
//! │ PrefixEventSource │─── PrefixEvent ───┐
//! └───────────────────┘                   │
//!                                         ▼
//!                                ┌──────────────┐
//!                                │ PrefixEngine │
//!                                └──────────────┘
//!                                         │
//!         ┌───────────────────────────────┼───────────────────────────┐
//!         │                               │                           │
//!         ▼                               ▼                           ▼
//! ┌───────────────────┐         ┌──────────────────┐          ┌─────────────┐
//! │ SharedPrefixState │         │ RouteComputation │          │   Events    │
//! │ (apply)           │         │ (recompute)      │          │  (notify)   │
//! └───────────────────┘         └──────────────────┘          └─────────────┘
//! ```
//!
//! ## Event Flow
//!
//! 1. Event received from the source
//! 2. Applied to the store, yielding the changed-prefix set
//! 3. Empty set: nothing to recompute, done
//! 4. Otherwise, check changed prefixes for conflicts
//! 5. Call RouteComputation::recompute() with exactly the changed set
//! 6. Emit event for monitoring/logging

use crate::config::EngineConfig;
use crate::error::Result;
use crate::state::{ChangedPrefixes, SharedPrefixState};
use crate::traits::{PrefixEvent, PrefixEventSource, RouteComputation};
use crate::types::{Prefix, PrefixKey};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

/// Events emitted by the PrefixEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started { source: String },

    /// An event changed nothing (duplicate advertise or unknown withdraw)
    Unchanged { key: PrefixKey },

    /// An event changed these prefixes; recomputation follows
    PrefixesChanged { prefixes: Vec<Prefix> },

    /// A changed prefix now has conflicting forwarding info
    ConflictDetected { prefix: Prefix },

    /// Route computation rejected a changed set
    RecomputeFailed { prefixes: Vec<Prefix>, error: String },

    /// Engine stopped
    Stopped { reason: String },
}

/// Core prefix engine
///
/// ## Lifecycle
///
/// 1. Create with [`PrefixEngine::new()`]
/// 2. Start with [`PrefixEngine::run()`]
/// 3. Engine runs until the source is exhausted or a shutdown signal arrives
///
/// ## Ordering
///
/// Events are applied one at a time in source order. The next event is not
/// read until route computation for the previous one has returned.
pub struct PrefixEngine {
    /// Where advertise/withdraw events come from
    event_source: Box<dyn PrefixEventSource>,

    /// Consumer of changed-prefix sets
    route_computation: Box<dyn RouteComputation>,

    /// The store, shared with management readers
    state: SharedPrefixState,

    /// Check changed prefixes for conflicting forwarding info
    warn_on_conflict: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl PrefixEngine {
    /// Create a new engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        event_source: Box<dyn PrefixEventSource>,
        route_computation: Box<dyn RouteComputation>,
        state: SharedPrefixState,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            event_source,
            route_computation,
            state,
            warn_on_conflict: config.warn_on_conflict,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Handle to the store this engine mutates
    pub fn state(&self) -> &SharedPrefixState {
        &self.state
    }

    /// Run the engine until the source ends or SIGINT is received
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the engine with a programmatic shutdown signal
    ///
    /// With `None`, falls back to waiting for SIGINT like [`run()`](Self::run).
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        let source_name = self.event_source.source_name().to_string();
        info!("Starting prefix engine (source={})", source_name);
        self.emit_event(EngineEvent::Started {
            source: source_name,
        });

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for shutdown signal: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        let mut events = self.event_source.watch();

        let reason = loop {
            tokio::select! {
                next = events.next() => match next {
                    Some(event) => self.handle_event(event).await,
                    None => break "Event source exhausted",
                },

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break "Shutdown signal";
                }
            }
        };

        self.emit_event(EngineEvent::Stopped {
            reason: reason.to_string(),
        });
        info!("Prefix engine stopped: {}", reason);

        Ok(())
    }

    /// Apply one event and propagate its changed set
    ///
    /// A failed recompute is logged and reported as
    /// [`EngineEvent::RecomputeFailed`]; the store keeps the change.
    async fn handle_event(&self, event: PrefixEvent) {
        let key = event.key().clone();
        let changed = self.state.apply(event).await;

        if changed.is_empty() {
            debug!("No effective change for {}", key);
            self.emit_event(EngineEvent::Unchanged { key });
            return;
        }

        if self.warn_on_conflict {
            for prefix in &changed {
                if self.state.has_conflict(prefix).await {
                    warn!(
                        "Conflicting forwarding algorithm/type among advertisers of {}",
                        prefix
                    );
                    self.emit_event(EngineEvent::ConflictDetected { prefix: *prefix });
                }
            }
        }

        let prefixes = sorted(&changed);
        self.emit_event(EngineEvent::PrefixesChanged {
            prefixes: prefixes.clone(),
        });

        if let Err(e) = self.route_computation.recompute(&changed).await {
            warn!(
                "Route computation {} failed for {:?}: {}",
                self.route_computation.name(),
                prefixes,
                e
            );
            self.emit_event(EngineEvent::RecomputeFailed {
                prefixes,
                error: e.to_string(),
            });
        }
    }

    /// Emit an engine event, dropping it if the channel is full
    fn emit_event(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!(
                "Event channel full, dropping event. Consider increasing event_channel_capacity."
            );
        }
    }
}

fn sorted(changed: &ChangedPrefixes) -> Vec<Prefix> {
    let mut prefixes: Vec<Prefix> = changed.iter().copied().collect();
    prefixes.sort();
    prefixes
}
