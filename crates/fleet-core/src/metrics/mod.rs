//! Metrics hooks for runner operations.
//!
//! Backends (prometheus, statsd, ...) implement [`MetricsBackend`] and are handed
//! to the runner with [`Runner::with_metrics`](crate::runner::Runner::with_metrics).
mod backend;
pub use backend::{MetricsBackend, MetricsHandle, OpOutcome};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
