// # Route Computation Trait
//
// The consumer of the store's changed-prefix signal. After each mutation
// that changed something, the engine hands the exact set of affected
// prefixes to the route computation, which recomputes those and nothing
// else.

use async_trait::async_trait;

use crate::state::ChangedPrefixes;

/// Trait for route computation implementations
///
/// # Contract
///
/// - `changed` is never empty
/// - Called once per effective mutation, in event order
/// - Errors are logged by the engine and do not stop event processing
#[async_trait]
pub trait RouteComputation: Send + Sync {
    /// Recompute routes for exactly the given prefixes
    async fn recompute(&self, changed: &ChangedPrefixes) -> Result<(), crate::Error>;

    /// Human-readable name for logs
    fn name(&self) -> &'static str;
}
