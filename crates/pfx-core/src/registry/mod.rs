//! Plugin-based event source registry
//!
//! Event sources register a factory under a type name; the daemon then
//! builds whichever source its configuration names, without hard-coded
//! if-else chains.
//!
//! ## Registration
//!
//! ```rust,ignore
//! // In pfx-source-file
//! pub fn register(registry: &SourceRegistry) {
//!     registry.register_event_source("file", Box::new(FileSourceFactory));
//! }
//! ```

use crate::config::EventSourceConfig;
use crate::error::{Error, Result};
use crate::traits::{PrefixEventSource, PrefixEventSourceFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry of event source factories
///
/// Interior mutability with `RwLock`: concurrent reads, exclusive writes.
#[derive(Default)]
pub struct SourceRegistry {
    event_sources: RwLock<HashMap<String, Box<dyn PrefixEventSourceFactory>>>,
}

impl SourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event source factory under `name`
    ///
    /// A later registration under the same name replaces the earlier one.
    pub fn register_event_source(
        &self,
        name: impl Into<String>,
        factory: Box<dyn PrefixEventSourceFactory>,
    ) {
        let mut sources = self
            .event_sources
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        sources.insert(name.into(), factory);
    }

    /// Create an event source from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn PrefixEventSource>)`: Created source instance
    /// - `Err(Error::Config)`: If the source type is not registered
    /// - `Err(Error)`: If the factory fails
    pub fn create_event_source(
        &self,
        config: &EventSourceConfig,
    ) -> Result<Box<dyn PrefixEventSource>> {
        let source_type = config.type_name();
        let sources = self
            .event_sources
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = sources
            .get(source_type)
            .ok_or_else(|| Error::config(format!("Unknown event source type: {}", source_type)))?;

        factory.create(config)
    }

    /// List all registered event source types
    pub fn list_event_sources(&self) -> Vec<String> {
        let sources = self
            .event_sources
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        sources.keys().cloned().collect()
    }

    /// Check if an event source type is registered
    pub fn has_event_source(&self, name: &str) -> bool {
        let sources = self
            .event_sources
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        sources.contains_key(name)
    }
}
