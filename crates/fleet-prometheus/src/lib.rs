//! Prometheus implementation of [`fleet_core::metrics::MetricsBackend`].
//!
//! ## Metrics
//! - `fleet_apps_submitted_total{backend}` - Counter
//! - `fleet_operations_total{backend, op, outcome}` - Counter
//! - `fleet_operation_duration_seconds{backend, op}` - Histogram
//! - `fleet_log_lines_total{backend}` - Counter
//!
//! No HTTP endpoint is provided; use [`PrometheusMetrics::gather`] or
//! [`PrometheusMetrics::encode_text`] from whatever exposes metrics.
use std::sync::Arc;

use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    proto::MetricFamily,
};

use fleet_core::metrics::{MetricsBackend, OpOutcome};

const NAMESPACE: &str = "fleet";

/// Label cardinality is bounded by the number of registered backends,
/// the four backend operations and two outcomes.
#[derive(Clone)]
pub struct PrometheusMetrics {
    submitted: CounterVec,
    operations: CounterVec,
    durations: HistogramVec,
    log_lines: CounterVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Register all collectors in `registry`.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let submitted = CounterVec::new(
            Opts::new("apps_submitted_total", "Apps accepted by a backend").namespace(NAMESPACE),
            &["backend"],
        )?;
        registry.register(Box::new(submitted.clone()))?;

        let operations = CounterVec::new(
            Opts::new("operations_total", "Backend calls by operation and outcome")
                .namespace(NAMESPACE),
            &["backend", "op", "outcome"],
        )?;
        registry.register(Box::new(operations.clone()))?;

        let durations = HistogramVec::new(
            HistogramOpts::new("operation_duration_seconds", "Backend call latency")
                .namespace(NAMESPACE)
                .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
            &["backend", "op"],
        )?;
        registry.register(Box::new(durations.clone()))?;

        let log_lines = CounterVec::new(
            Opts::new("log_lines_total", "Log lines delivered to callers").namespace(NAMESPACE),
            &["backend"],
        )?;
        registry.register(Box::new(log_lines.clone()))?;

        Ok(Self {
            submitted,
            operations,
            durations,
            log_lines,
            registry,
        })
    }

    /// Create a backend with a private registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_submitted(&self, backend: &str) {
        self.submitted.with_label_values(&[backend]).inc();
    }

    fn record_operation(&self, backend: &str, op: &str, outcome: OpOutcome, duration_ms: u64) {
        self.operations
            .with_label_values(&[backend, op, outcome.as_label()])
            .inc();
        self.durations
            .with_label_values(&[backend, op])
            .observe(duration_ms as f64 / 1000.0);
    }

    fn record_log_lines(&self, backend: &str, lines: u64) {
        self.log_lines
            .with_label_values(&[backend])
            .inc_by(lines as f64);
    }
}
