//! In-memory simulated scheduler backend.
//!
//! Useful for trying the runner and the CLI without a cluster, and as a
//! realistic backend in tests. Nothing is executed.
mod error;
pub use error::SimError;

mod request;
pub use request::{SimRequest, SimTask};

mod scheduler;
pub use scheduler::SimScheduler;

mod store;

use std::sync::Arc;

use fleet_core::{registry::SchedulerRegistry, scheduler::Scheduler};

/// Backend name of the simulated scheduler.
pub const BACKEND: &str = "sim";

/// Register the simulated backend in the given registry.
///
/// Each session gets its own, initially empty, job table.
pub fn register_sim_scheduler(registry: &mut SchedulerRegistry) {
    registry.register(BACKEND, |session: &str| {
        Ok(Arc::new(SimScheduler::new(session)) as Arc<dyn Scheduler>)
    });
}
