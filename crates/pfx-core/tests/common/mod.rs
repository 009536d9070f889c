//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles for the external collaborators
//! of the prefix engine: the distribution layer and route computation.

#![allow(dead_code)]

use pfx_core::error::{Error, Result};
use pfx_core::traits::{PrefixEvent, PrefixEventSource, RouteComputation};
use pfx_core::{
    ChangedPrefixes, ForwardingAlgorithm, ForwardingType, Prefix, PrefixEntry, PrefixKey,
};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_stream::Stream;

/// An event source fed by the test through a channel
///
/// The stream ends once every sender has been dropped.
pub struct ControlledEventSource {
    engine_rx: Mutex<Option<mpsc::UnboundedReceiver<PrefixEvent>>>,
}

impl ControlledEventSource {
    pub fn new() -> (Self, mpsc::UnboundedSender<PrefixEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let source = Self {
            engine_rx: Mutex::new(Some(rx)),
        };
        (source, tx)
    }
}

impl PrefixEventSource for ControlledEventSource {
    fn watch(&self) -> Pin<Box<dyn Stream<Item = PrefixEvent> + Send + 'static>> {
        let rx = self
            .engine_rx
            .lock()
            .unwrap()
            .take()
            .expect("watch() can only be called once");

        Box::pin(tokio_stream::wrappers::UnboundedReceiverStream::new(rx))
    }

    fn source_name(&self) -> &str {
        "controlled"
    }
}

/// A route computation that records every changed set it receives
#[derive(Clone, Default)]
pub struct RecordingRouteComputation {
    calls: Arc<Mutex<Vec<ChangedPrefixes>>>,
    fail_next: Arc<AtomicUsize>,
}

impl RecordingRouteComputation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every changed set received, in call order
    pub fn calls(&self) -> Vec<ChangedPrefixes> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Make the next `n` calls fail (they are still recorded)
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl RouteComputation for RecordingRouteComputation {
    async fn recompute(&self, changed: &ChangedPrefixes) -> Result<()> {
        self.calls.lock().unwrap().push(changed.clone());

        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::route_computation("injected failure"));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

pub fn prefix(s: &str) -> Prefix {
    s.parse().expect("valid prefix")
}

pub fn key(node: &str, area: &str, p: &str) -> PrefixKey {
    PrefixKey::new(node, area, prefix(p)).expect("valid key")
}

pub fn entry(algo: ForwardingAlgorithm) -> PrefixEntry {
    PrefixEntry::new(algo, ForwardingType::Ip)
}

pub fn advertise(node: &str, area: &str, p: &str, entry: PrefixEntry) -> PrefixEvent {
    PrefixEvent::Advertise {
        key: key(node, area, p),
        entry,
    }
}

pub fn withdraw(node: &str, area: &str, p: &str) -> PrefixEvent {
    PrefixEvent::Withdraw {
        key: key(node, area, p),
    }
}
