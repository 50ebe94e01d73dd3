//! Contract every scheduler backend implements.
//!
//! The core never talks to an execution platform directly; it resolves a
//! [`Scheduler`] by backend name and drives it through the operations below.
//! Job state transitions are owned by the backend, the core only reads them.
mod describe;
pub use describe::DescribeAppResponse;

mod dryrun;
pub use dryrun::DryRunInfo;

mod logs;
pub use logs::{LogQuery, LogStream, filter_regex, line_filter};

use async_trait::async_trait;
use fleet_model::{AppDef, AppId, RunConfig, RunOpts};

use crate::error::SchedulerError;

/// One backend capable of submitting, describing, cancelling and streaming logs of jobs.
///
/// Implementations must be cheap to share behind an `Arc`; the runner keeps one
/// instance per backend name for the lifetime of a session.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Backend name used in app handles (the handle's scheme).
    fn backend(&self) -> &str;

    fn session_name(&self) -> &str;

    /// Options this backend accepts in a [`RunConfig`].
    fn run_opts(&self) -> RunOpts;

    /// Reject apps that use features this backend cannot satisfy.
    ///
    /// Called before [`Scheduler::submit_dryrun`]. The default only checks the app's own invariants.
    fn validate(&self, app: &AppDef) -> Result<(), SchedulerError> {
        app.validate()?;
        Ok(())
    }

    /// Build the backend-native request for `app` without side effects.
    ///
    /// `cfg` has already been resolved against [`Scheduler::run_opts`].
    /// Equal inputs must produce equal requests.
    fn submit_dryrun(&self, app: &AppDef, cfg: &RunConfig) -> Result<DryRunInfo, SchedulerError>;

    /// Submit a request built by [`Scheduler::submit_dryrun`] and return the backend-local id.
    async fn schedule(&self, dryrun: DryRunInfo) -> Result<AppId, SchedulerError>;

    /// Read the current state of a job.
    ///
    /// Unknown ids yield [`DescribeAppResponse::unknown`], never an error.
    async fn describe(&self, app_id: &str) -> Result<DescribeAppResponse, SchedulerError>;

    /// Best-effort cancellation. Must succeed for jobs that already finished.
    async fn cancel(&self, app_id: &str) -> Result<(), SchedulerError>;

    /// Open the log stream of one replica.
    ///
    /// Lines must fully match `query.regex` and keep their source order. With
    /// `query.should_tail` the stream stays open until the source closes.
    async fn log_iter(
        &self,
        app_id: &str,
        role_name: &str,
        replica_id: u32,
        query: &LogQuery,
    ) -> Result<LogStream, SchedulerError>;
}
