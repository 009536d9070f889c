//! Error types for the prefix state system
//!
//! The store itself is total: advertise, withdraw and every query accept any
//! input and never fail. Errors only arise on the surfaces around it
//! (parsing keys and prefixes, configuration, event sources, route
//! computation callbacks).

use thiserror::Error;

/// Result type alias for prefix state operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the prefix state system
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed prefix key string
    #[error("Invalid prefix key: {0}")]
    InvalidKey(String),

    /// Malformed IP prefix
    #[error("Invalid prefix: {0}")]
    InvalidPrefix(String),

    /// Event source errors (distribution layer side)
    #[error("Event source error: {0}")]
    EventSource(String),

    /// Route computation callback errors
    #[error("Route computation error: {0}")]
    RouteComputation(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid key error
    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }

    /// Create an invalid prefix error
    pub fn invalid_prefix(msg: impl Into<String>) -> Self {
        Self::InvalidPrefix(msg.into())
    }

    /// Create an event source error
    pub fn event_source(msg: impl Into<String>) -> Self {
        Self::EventSource(msg.into())
    }

    /// Create a route computation error
    pub fn route_computation(msg: impl Into<String>) -> Self {
        Self::RouteComputation(msg.into())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
