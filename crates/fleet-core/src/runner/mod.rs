//! Orchestration entry point: resolves a backend by name and dispatches to it.
//!
//! The runner owns one lazily built [`Scheduler`] per backend name for the
//! lifetime of its session. Every call goes to exactly one backend; retries
//! and timeouts are the backend's business.
mod id;
pub use id::make_app_id;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use fleet_model::{AppDef, AppHandle, AppState, DEFAULT_SESSION, RunConfig, RunOpts};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{CoreResult, SchedulerError},
    metrics::{MetricsHandle, OpOutcome, noop_metrics},
    registry::SchedulerRegistry,
    scheduler::{DescribeAppResponse, DryRunInfo, LogQuery, LogStream, Scheduler},
};

pub struct Runner {
    session: String,
    registry: SchedulerRegistry,
    schedulers: Mutex<HashMap<String, Arc<dyn Scheduler>>>,
    metrics: MetricsHandle,
}

impl Runner {
    /// Create a runner for `session`. An empty session name falls back to `"default"`.
    pub fn new(session: impl Into<String>, registry: SchedulerRegistry) -> Self {
        let session = session.into();
        let session = if session.is_empty() {
            DEFAULT_SESSION.to_string()
        } else {
            session
        };
        Self {
            session,
            registry,
            schedulers: Mutex::new(HashMap::new()),
            metrics: noop_metrics(),
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    #[inline]
    pub fn session_name(&self) -> &str {
        &self.session
    }

    #[inline]
    pub(crate) fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }

    /// Names of every registered backend, whether or not it can be constructed.
    pub fn scheduler_backends(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Return the session's instance of `backend`, constructing it on first use.
    ///
    /// Construction failures are not cached.
    pub fn scheduler(&self, backend: &str) -> CoreResult<Arc<dyn Scheduler>> {
        let mut cache = self
            .schedulers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(sched) = cache.get(backend) {
            return Ok(Arc::clone(sched));
        }

        let sched = self.registry.create(backend, &self.session)?;
        debug!(backend, session = %self.session, "scheduler constructed");
        cache.insert(backend.to_string(), Arc::clone(&sched));
        Ok(sched)
    }

    pub fn run_opts(&self, backend: &str) -> CoreResult<RunOpts> {
        Ok(self.scheduler(backend)?.run_opts())
    }

    /// Validate `app`, resolve `cfg` against the backend's options and build the request.
    ///
    /// Nothing is submitted.
    #[instrument(level = "debug", skip(self, app, cfg), fields(app = %app.name))]
    pub fn dryrun(&self, app: &AppDef, backend: &str, cfg: &RunConfig) -> CoreResult<DryRunInfo> {
        let sched = self.scheduler(backend)?;
        sched.validate(app)?;

        let resolved = sched.run_opts().resolve(cfg)?;
        let info = sched.submit_dryrun(app, &resolved)?;
        debug!(cfg = %resolved, "dry-run request built");

        Ok(info.with_source(app.clone(), resolved))
    }

    /// Submit a request previously built by [`Runner::dryrun`].
    #[instrument(level = "debug", skip(self, dryrun), fields(backend = %dryrun.backend()))]
    pub async fn schedule(&self, dryrun: DryRunInfo) -> CoreResult<AppHandle> {
        let backend = dryrun.backend().to_string();
        let sched = self.scheduler(&backend)?;

        let started = Instant::now();
        let res = sched.schedule(dryrun).await;
        self.observe(&backend, "schedule", started, &res);
        let app_id = res?;

        self.metrics.record_submitted(&backend);
        let handle = AppHandle::new(backend, self.session.clone(), app_id);
        info!(%handle, "app scheduled");
        Ok(handle)
    }

    /// Validate, resolve, dry-run and schedule `app` on `backend`.
    #[instrument(level = "debug", skip(self, app, cfg), fields(app = %app.name))]
    pub async fn run(&self, app: &AppDef, backend: &str, cfg: &RunConfig) -> CoreResult<AppHandle> {
        let info = self.dryrun(app, backend, cfg)?;
        self.schedule(info).await
    }

    /// Describe the job behind `handle`.
    #[instrument(level = "debug", skip(self))]
    pub async fn status(&self, handle: &str) -> CoreResult<DescribeAppResponse> {
        let handle: AppHandle = handle.parse()?;
        let sched = self.scheduler(&handle.backend)?;

        let started = Instant::now();
        let res = sched.describe(&handle.app_id).await;
        self.observe(&handle.backend, "describe", started, &res);
        Ok(res?)
    }

    /// Reconstruct the app definition of `handle`, `None` if the backend does not know it.
    pub async fn describe(&self, handle: &str) -> CoreResult<Option<AppDef>> {
        let desc = self.status(handle).await?;
        Ok((!desc.is_missing()).then(|| desc.app_def()))
    }

    /// Poll [`Runner::status`] every `interval` until the job is terminal or its state is unknown.
    #[instrument(level = "debug", skip(self))]
    pub async fn wait(&self, handle: &str, interval: Duration) -> CoreResult<DescribeAppResponse> {
        loop {
            let desc = self.status(handle).await?;
            if desc.is_terminal() || desc.state == AppState::Unknown {
                debug!(state = %desc.state, "wait finished");
                return Ok(desc);
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Cancel the job behind `handle` if it exists and is still running.
    #[instrument(level = "debug", skip(self))]
    pub async fn cancel(&self, handle: &str) -> CoreResult<()> {
        let parsed: AppHandle = handle.parse()?;
        let desc = self.status(handle).await?;

        if desc.is_missing() {
            warn!("app does not exist, nothing to cancel");
            return Ok(());
        }
        if desc.is_terminal() {
            debug!(state = %desc.state, "app already finished, nothing to cancel");
            return Ok(());
        }

        let sched = self.scheduler(&parsed.backend)?;
        let started = Instant::now();
        let res = sched.cancel(&parsed.app_id).await;
        self.observe(&parsed.backend, "cancel", started, &res);
        res?;

        info!("cancel requested");
        Ok(())
    }

    /// Open the log stream of exactly one replica.
    #[instrument(level = "debug", skip(self, query))]
    pub async fn log_lines(
        &self,
        handle: &str,
        role_name: &str,
        replica_id: u32,
        query: &LogQuery,
    ) -> CoreResult<LogStream> {
        let handle: AppHandle = handle.parse()?;
        let sched = self.scheduler(&handle.backend)?;

        let started = Instant::now();
        let res = sched
            .log_iter(&handle.app_id, role_name, replica_id, query)
            .await;
        self.observe(&handle.backend, "log_iter", started, &res);
        Ok(res?)
    }

    fn observe<T>(
        &self,
        backend: &str,
        op: &'static str,
        started: Instant,
        res: &Result<T, SchedulerError>,
    ) {
        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.metrics
            .record_operation(backend, op, OpOutcome::of(res), elapsed);
        if let Err(e) = res {
            debug!(backend, op, error = %e, "backend call failed");
        }
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("session", &self.session)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
