//! Scheduler double shared by the unit tests of this crate.
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use fleet_model::{AppDef, AppId, AppState, CfgValue, OptType, RetryPolicy, RunConfig, RunOpts};
use futures::{StreamExt, stream};

use crate::{
    error::SchedulerError,
    registry::SchedulerRegistry,
    runner::make_app_id,
    scheduler::{DescribeAppResponse, DryRunInfo, LogQuery, LogStream, Scheduler, filter_regex},
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FakeRequest {
    pub app_name: String,
    pub cfg: RunConfig,
}

#[derive(Default, Clone)]
struct ReplicaLog {
    lines: Vec<String>,
    fail: bool,
    hang: bool,
}

pub(crate) struct FakeScheduler {
    backend: String,
    session: String,
    apps: Mutex<HashMap<String, (AppDef, AppState)>>,
    logs: HashMap<(String, u32), ReplicaLog>,
    finish_after: Option<usize>,
    pub schedule_calls: AtomicUsize,
    pub describe_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
    pub log_calls: AtomicUsize,
}

impl FakeScheduler {
    pub fn new(backend: &str, session: &str) -> Self {
        Self {
            backend: backend.to_string(),
            session: session.to_string(),
            apps: Mutex::new(HashMap::new()),
            logs: HashMap::new(),
            finish_after: None,
            schedule_calls: AtomicUsize::new(0),
            describe_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
            log_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_app(self, app_id: &str, app: AppDef, state: AppState) -> Self {
        self.apps
            .lock()
            .expect("apps lock")
            .insert(app_id.to_string(), (app, state));
        self
    }

    pub fn with_lines(mut self, role: &str, replica_id: u32, lines: &[&str]) -> Self {
        self.replica(role, replica_id).lines = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    /// The replica's stream fails after yielding its lines.
    pub fn failing(mut self, role: &str, replica_id: u32) -> Self {
        self.replica(role, replica_id).fail = true;
        self
    }

    /// The replica's stream never closes after yielding its lines.
    pub fn hanging(mut self, role: &str, replica_id: u32) -> Self {
        self.replica(role, replica_id).hang = true;
        self
    }

    /// Non-terminal apps report SUCCEEDED from the `n`-th describe call on.
    pub fn finishing_after(mut self, n: usize) -> Self {
        self.finish_after = Some(n);
        self
    }

    pub fn state(&self, app_id: &str) -> Option<AppState> {
        self.apps
            .lock()
            .expect("apps lock")
            .get(app_id)
            .map(|(_, s)| *s)
    }

    fn replica(&mut self, role: &str, replica_id: u32) -> &mut ReplicaLog {
        self.logs
            .entry((role.to_string(), replica_id))
            .or_default()
    }
}

#[async_trait]
impl Scheduler for FakeScheduler {
    fn backend(&self) -> &str {
        &self.backend
    }

    fn session_name(&self) -> &str {
        &self.session
    }

    fn run_opts(&self) -> RunOpts {
        let mut opts = RunOpts::new();
        opts.add("priority", OptType::Int, "job priority", Some(CfgValue::Int(10)), false)
            .expect("valid option");
        opts.add("queue", OptType::Str, "queue name", None, false)
            .expect("valid option");
        opts
    }

    fn validate(&self, app: &AppDef) -> Result<(), SchedulerError> {
        app.validate()?;
        if let Some(role) = app
            .roles
            .iter()
            .find(|r| r.retry_policy == RetryPolicy::Replica)
        {
            return Err(SchedulerError::Unsupported {
                backend: self.backend.clone(),
                app: app.name.clone(),
                reason: format!("role '{}' uses an unsupported retry policy", role.name),
            });
        }
        Ok(())
    }

    fn submit_dryrun(&self, app: &AppDef, cfg: &RunConfig) -> Result<DryRunInfo, SchedulerError> {
        let request = FakeRequest {
            app_name: app.name.clone(),
            cfg: cfg.clone(),
        };
        let rendered = format!("{} ({cfg})", app.name);
        Ok(DryRunInfo::new(self.backend.clone(), request, rendered))
    }

    async fn schedule(&self, dryrun: DryRunInfo) -> Result<AppId, SchedulerError> {
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);
        let app = dryrun.app().cloned();
        let request: FakeRequest = dryrun.into_request()?;

        let app_id = make_app_id(&request.app_name);
        let app = app.unwrap_or_else(|| AppDef::new(request.app_name));
        self.apps
            .lock()
            .expect("apps lock")
            .insert(app_id.clone(), (app, AppState::Submitted));
        Ok(app_id)
    }

    async fn describe(&self, app_id: &str) -> Result<DescribeAppResponse, SchedulerError> {
        let calls = self.describe_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let mut apps = self.apps.lock().expect("apps lock");
        let Some((app, state)) = apps.get_mut(app_id) else {
            return Ok(DescribeAppResponse::unknown(app_id));
        };

        if self.finish_after.is_some_and(|n| calls >= n) && !state.is_terminal() {
            *state = AppState::Succeeded;
        }
        let mut resp = DescribeAppResponse::new(app_id, *state);
        resp.roles = app.roles.clone();
        Ok(resp)
    }

    async fn cancel(&self, app_id: &str) -> Result<(), SchedulerError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((_, state)) = self.apps.lock().expect("apps lock").get_mut(app_id) {
            *state = AppState::Cancelled;
        }
        Ok(())
    }

    async fn log_iter(
        &self,
        _app_id: &str,
        role_name: &str,
        replica_id: u32,
        query: &LogQuery,
    ) -> Result<LogStream, SchedulerError> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        let log = self
            .logs
            .get(&(role_name.to_string(), replica_id))
            .cloned()
            .unwrap_or_default();

        let mut items: Vec<Result<String, SchedulerError>> =
            log.lines.into_iter().map(Ok).collect();
        if log.fail {
            items.push(Err(SchedulerError::Logs(format!(
                "replica {replica_id} unreachable"
            ))));
        }

        let lines = stream::iter(items);
        let lines: LogStream = if log.hang {
            lines.chain(stream::pending()).boxed()
        } else {
            lines.boxed()
        };
        filter_regex(query.regex.as_deref(), lines)
    }
}

/// Registry with `fake` mapped to the given instance.
pub(crate) fn registry_with(fake: &Arc<FakeScheduler>) -> SchedulerRegistry {
    let fake = Arc::clone(fake);
    let mut registry = SchedulerRegistry::new();
    registry.register(fake.backend.clone(), move |_: &str| {
        Ok(Arc::clone(&fake) as Arc<dyn Scheduler>)
    });
    registry
}
