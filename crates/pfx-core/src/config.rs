//! Configuration types for the prefix state system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PfxConfig {
    /// Where advertise/withdraw events come from
    #[serde(default)]
    pub event_source: EventSourceConfig,

    /// Store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl PfxConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.event_source.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// Event source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventSourceConfig {
    /// Replay a JSON-lines file of prefix events
    File {
        /// Path to the events file
        path: String,
    },

    /// Custom event source
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl EventSourceConfig {
    /// Validate the event source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            EventSourceConfig::File { path } => {
                if path.is_empty() {
                    return Err(crate::Error::config("File event source path cannot be empty"));
                }
                Ok(())
            }
            EventSourceConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom event source factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom event source config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Registry name of the source type
    pub fn type_name(&self) -> &str {
        match self {
            EventSourceConfig::File { .. } => "file",
            EventSourceConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for EventSourceConfig {
    fn default() -> Self {
        EventSourceConfig::File {
            path: "prefix-events.jsonl".to_string(),
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Log every effective advertise/withdraw transition at debug level
    #[serde(default = "default_true")]
    pub log_advertisements: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log_advertisements: true,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the engine event channel
    ///
    /// When full, engine events are dropped with a warning log.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Warn when a changed prefix ends up with conflicting forwarding info
    #[serde(default = "default_true")]
    pub warn_on_conflict: bool,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
            warn_on_conflict: true,
        }
    }
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_true() -> bool {
    true
}
