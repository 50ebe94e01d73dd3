use std::sync::Arc;

/// Outcome of one backend call, for metrics classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpOutcome {
    Success,
    Failure,
}

impl OpOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            OpOutcome::Success => "success",
            OpOutcome::Failure => "failure",
        }
    }

    #[inline]
    pub fn of<T, E>(res: &Result<T, E>) -> Self {
        if res.is_ok() {
            OpOutcome::Success
        } else {
            OpOutcome::Failure
        }
    }
}

/// Metrics collection interface.
///
/// Implementations are injected into the [`Runner`](crate::runner::Runner) and
/// called around every backend operation.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record an app accepted by `backend`.
    fn record_submitted(&self, backend: &str);

    /// Record one backend call.
    ///
    /// # Arguments
    /// - `backend`: backend name
    /// - `op`: operation (`schedule`, `describe`, `cancel`, `log_iter`)
    /// - `outcome`: whether the call returned an error
    /// - `duration_ms`: wall time of the call
    fn record_operation(&self, backend: &str, op: &str, outcome: OpOutcome, duration_ms: u64);

    /// Record `lines` log lines delivered to a caller.
    fn record_log_lines(&self, backend: &str, lines: u64);
}

/// Shared handle to a metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
