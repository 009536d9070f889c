//! Core traits for the prefix state system
//!
//! This module defines the seams to the external collaborators.
//!
//! - [`PrefixEventSource`]: Deliver advertise/withdraw events
//! - [`RouteComputation`]: Consume changed-prefix sets

pub mod event_source;
pub mod route_computation;

pub use event_source::{PrefixEvent, PrefixEventSource, PrefixEventSourceFactory};
pub use route_computation::RouteComputation;
