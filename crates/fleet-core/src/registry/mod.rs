//! Name → constructor map used by the runner to find backends.
//!
//! Factories are registered once at process start. A backend is only
//! constructed when first used, so a backend whose runtime dependency is
//! missing does not prevent the others from working.
use std::{collections::BTreeMap, fmt, sync::Arc};

use tracing::{debug, instrument};

use crate::{
    error::{CoreError, CoreResult, SchedulerError},
    scheduler::Scheduler,
};

/// Builds a backend for the given session name.
pub type SchedulerFactory =
    Arc<dyn Fn(&str) -> Result<Arc<dyn Scheduler>, SchedulerError> + Send + Sync>;

#[derive(Default, Clone)]
pub struct SchedulerRegistry {
    factories: BTreeMap<String, SchedulerFactory>,
}

impl SchedulerRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`, replacing any previous registration.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&str) -> Result<Arc<dyn Scheduler>, SchedulerError> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(backend = %name, "scheduler factory registered");
        self.factories.insert(name, Arc::new(factory));
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered backend names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Construct the backend registered under `name`.
    #[instrument(level = "debug", skip(self))]
    pub fn create(&self, name: &str, session: &str) -> CoreResult<Arc<dyn Scheduler>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| CoreError::UnknownBackend(name.to_string()))?;
        factory(session).map_err(CoreError::from)
    }
}

impl fmt::Debug for SchedulerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerRegistry")
            .field("backends", &self.names())
            .finish()
    }
}
