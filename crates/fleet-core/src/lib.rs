//! Scheduler-agnostic job orchestration: the backend contract, the runner that
//! dispatches to backends by name, and the multi-replica log aggregator.
pub mod error;
pub mod logs;
pub mod metrics;
pub mod registry;
pub mod runner;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub mod prelude {
    pub use crate::error::{CoreError, CoreResult, SchedulerError};
    pub use crate::logs::LogTailer;
    pub use crate::metrics::{MetricsBackend, MetricsHandle, OpOutcome};
    pub use crate::registry::SchedulerRegistry;
    pub use crate::runner::{Runner, make_app_id};
    pub use crate::scheduler::{
        DescribeAppResponse, DryRunInfo, LogQuery, LogStream, Scheduler, filter_regex,
    };
}
