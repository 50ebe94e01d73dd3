use crate::metrics::backend::{MetricsBackend, OpOutcome};

/// Metrics backend that records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_submitted(&self, _: &str) {}

    #[inline(always)]
    fn record_operation(&self, _: &str, _: &str, _: OpOutcome, _: u64) {}

    #[inline(always)]
    fn record_log_lines(&self, _: &str, _: u64) {}
}
