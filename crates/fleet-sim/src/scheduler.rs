use async_trait::async_trait;
use tracing::{debug, info, instrument};

use fleet_core::{
    error::SchedulerError,
    runner::make_app_id,
    scheduler::{DescribeAppResponse, DryRunInfo, LogQuery, LogStream, Scheduler, filter_regex},
};
use fleet_model::{
    AppDef, AppId, AppState, CfgValue, OptType, ReplicaStatus, RoleStatus, RunConfig, RunOpts,
};

use crate::{
    BACKEND,
    error::SimError,
    request::SimRequest,
    store::{JobStore, SimJob},
};

/// Backend that keeps submitted jobs in memory and executes nothing.
///
/// Every replica starts with a single `launching ...` log line. Job state and
/// further log output are driven through [`SimScheduler::set_state`],
/// [`SimScheduler::push_log`], [`SimScheduler::close_logs`] and
/// [`SimScheduler::fail_logs`].
pub struct SimScheduler {
    session: String,
    store: JobStore,
}

impl SimScheduler {
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            store: JobStore::default(),
        }
    }

    /// Move a job to `state`. Terminal states close every log stream of the job.
    pub fn set_state(&self, app_id: &str, state: AppState) -> Result<(), SimError> {
        self.store.with_job(app_id, |job| {
            debug!(app_id, from = %job.state, to = %state, "sim state transition");
            job.transition(state);
            Ok(())
        })
    }

    /// Attach a status message to a job, reported by `describe`.
    pub fn set_msg(&self, app_id: &str, msg: impl Into<String>) -> Result<(), SimError> {
        let msg = msg.into();
        self.store.with_job(app_id, |job| {
            job.msg = msg;
            Ok(())
        })
    }

    /// Append a line to one replica's log. Lines pushed after close are dropped.
    pub fn push_log(
        &self,
        app_id: &str,
        role: &str,
        replica_id: u32,
        line: impl Into<String>,
    ) -> Result<(), SimError> {
        let line = line.into();
        self.store.with_job(app_id, |job| {
            job.replica(app_id, role, replica_id)?.push(line);
            Ok(())
        })
    }

    /// End one replica's log; followers stop after the remaining lines.
    pub fn close_logs(&self, app_id: &str, role: &str, replica_id: u32) -> Result<(), SimError> {
        self.store.with_job(app_id, |job| {
            job.replica(app_id, role, replica_id)?.close();
            Ok(())
        })
    }

    /// Make one replica's log stream fail with `reason` after its remaining lines.
    pub fn fail_logs(
        &self,
        app_id: &str,
        role: &str,
        replica_id: u32,
        reason: impl Into<String>,
    ) -> Result<(), SimError> {
        let reason = reason.into();
        self.store.with_job(app_id, |job| {
            job.replica(app_id, role, replica_id)?.fail(reason);
            Ok(())
        })
    }

    fn unsupported(&self, app: &AppDef, reason: String) -> SchedulerError {
        SchedulerError::Unsupported {
            backend: BACKEND.to_string(),
            app: app.name.clone(),
            reason,
        }
    }
}

#[async_trait]
impl Scheduler for SimScheduler {
    fn backend(&self) -> &str {
        BACKEND
    }

    fn session_name(&self) -> &str {
        &self.session
    }

    fn run_opts(&self) -> RunOpts {
        let mut opts = RunOpts::new();
        let declared = [
            (
                "namespace",
                OptType::Str,
                "namespace to submit the job to",
                Some(CfgValue::from("default")),
            ),
            (
                "priority",
                OptType::Int,
                "scheduling priority, higher runs first",
                Some(CfgValue::Int(0)),
            ),
            (
                "labels",
                OptType::list_of(OptType::Str),
                "labels attached to every task",
                None,
            ),
            (
                "auto_complete",
                OptType::Bool,
                "mark the job SUCCEEDED right after submission",
                Some(CfgValue::Bool(false)),
            ),
        ];
        for (name, opt_type, help, default) in declared {
            if let Err(e) = opts.add(name, opt_type, help, default, false) {
                debug!(error = %e, "skipping invalid sim option");
            }
        }
        opts
    }

    fn validate(&self, app: &AppDef) -> Result<(), SchedulerError> {
        app.validate()?;
        if app.roles.is_empty() {
            return Err(self.unsupported(app, "app has no roles".into()));
        }
        if let Some(role) = app.roles.iter().find(|r| r.base_image.is_some()) {
            return Err(self.unsupported(
                app,
                format!("role '{}' sets base_image, which is not supported", role.name),
            ));
        }
        Ok(())
    }

    fn submit_dryrun(&self, app: &AppDef, cfg: &RunConfig) -> Result<DryRunInfo, SchedulerError> {
        let request = SimRequest::build(app, cfg);
        let rendered = request.render()?;
        Ok(DryRunInfo::new(BACKEND, request, rendered))
    }

    #[instrument(level = "debug", skip(self, dryrun))]
    async fn schedule(&self, dryrun: DryRunInfo) -> Result<AppId, SchedulerError> {
        let app = dryrun.app().cloned();
        let mut request: SimRequest = dryrun.into_request()?;

        let app_id = make_app_id(&request.app_name);
        request.bind_app_id(&app_id);
        let app = app.unwrap_or_else(|| AppDef::new(request.app_name.clone()));
        let auto_complete = request.auto_complete;

        let mut job = SimJob::new(app, request);
        if auto_complete {
            job.transition(AppState::Succeeded);
        }
        self.store.lock().insert(app_id.clone(), job);

        info!(%app_id, session = %self.session, auto_complete, "sim job accepted");
        Ok(app_id)
    }

    async fn describe(&self, app_id: &str) -> Result<DescribeAppResponse, SchedulerError> {
        let jobs = self.store.lock();
        let Some(job) = jobs.get(app_id) else {
            return Ok(DescribeAppResponse::unknown(app_id));
        };

        let mut resp = DescribeAppResponse::new(app_id, job.state);
        resp.msg = job.msg.clone();
        resp.roles = job.app.roles.clone();
        resp.roles_statuses = job
            .app
            .roles
            .iter()
            .map(|role| RoleStatus {
                role: role.name.clone(),
                replicas: job
                    .request
                    .tasks
                    .iter()
                    .filter(|t| t.role == role.name)
                    .map(|t| ReplicaStatus {
                        id: t.replica_id,
                        role: t.role.clone(),
                        state: job.state,
                        hostname: format!("{}.{}.sim", t.name, job.request.namespace),
                    })
                    .collect(),
            })
            .collect();
        Ok(resp)
    }

    async fn cancel(&self, app_id: &str) -> Result<(), SchedulerError> {
        let mut jobs = self.store.lock();
        match jobs.get_mut(app_id) {
            Some(job) if !job.state.is_terminal() => {
                job.transition(AppState::Cancelled);
                info!(app_id, "sim job cancelled");
            }
            Some(_) => debug!(app_id, "sim job already finished"),
            None => debug!(app_id, "sim job not found"),
        }
        Ok(())
    }

    async fn log_iter(
        &self,
        app_id: &str,
        role_name: &str,
        replica_id: u32,
        query: &LogQuery,
    ) -> Result<LogStream, SchedulerError> {
        let lines = self
            .store
            .open(
                app_id,
                role_name,
                replica_id,
                query.should_tail,
                query.since,
                query.until,
            )
            .map_err(|e| SchedulerError::Logs(e.to_string()))?;
        filter_regex(query.regex.as_deref(), lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::prelude::*;
    use fleet_model::{LogTarget, Role, macros::REPLICA_ID};
    use futures::StreamExt;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn app() -> AppDef {
        AppDef::new("echo").with_role(
            Role::new("echo", "/tmp")
                .with_entrypoint("/bin/echo")
                .with_args(["hello", REPLICA_ID])
                .with_replicas(2),
        )
    }

    fn runner_with(sim: &Arc<SimScheduler>) -> Arc<Runner> {
        let sim = Arc::clone(sim);
        let mut registry = SchedulerRegistry::new();
        registry.register(BACKEND, move |_: &str| Ok(Arc::clone(&sim) as Arc<dyn Scheduler>));
        Arc::new(Runner::new("default", registry))
    }

    #[test]
    fn dryrun_is_deterministic() {
        let sim = SimScheduler::new("default");
        let cfg = sim.run_opts().resolve(&RunConfig::new()).expect("defaults resolve");

        let a = sim.submit_dryrun(&app(), &cfg).expect("dryrun");
        let b = sim.submit_dryrun(&app(), &cfg).expect("dryrun");

        assert_eq!(a.request::<SimRequest>(), b.request::<SimRequest>());
        assert_eq!(a.to_string(), b.to_string());
        assert!(a.to_string().contains("name: echo-1"));
    }

    #[test]
    fn validate_rejects_empty_app_and_base_image() {
        let sim = SimScheduler::new("default");

        match sim.validate(&AppDef::new("empty")) {
            Err(SchedulerError::Unsupported { reason, .. }) => assert!(reason.contains("no roles")),
            other => panic!("expected Unsupported, got {other:?}"),
        }

        let app = AppDef::new("layered")
            .with_role(Role::new("r", "img").with_base_image("base"));
        match sim.validate(&app) {
            Err(SchedulerError::Unsupported { reason, .. }) => assert!(reason.contains("base_image")),
            other => panic!("expected Unsupported, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_describe_cancel_lifecycle() {
        let sim = Arc::new(SimScheduler::new("default"));
        let runner = runner_with(&sim);

        let handle = runner
            .run(&app(), BACKEND, &RunConfig::new().with("namespace", "ml"))
            .await
            .expect("run should succeed");
        let handle = handle.to_string();

        let desc = runner.status(&handle).await.expect("status");
        assert_eq!(desc.state, AppState::Submitted);
        assert_eq!(desc.roles_statuses[0].replicas.len(), 2);
        assert!(desc.roles_statuses[0].replicas[1].hostname.starts_with("echo-1.ml"));

        runner.cancel(&handle).await.expect("cancel");
        let desc = runner.status(&handle).await.expect("status");
        assert_eq!(desc.state, AppState::Cancelled);
        assert!(desc.is_terminal());
    }

    #[tokio::test]
    async fn unknown_app_describes_as_unknown() {
        let sim = SimScheduler::new("default");
        let desc = sim.describe("missing-1").await.expect("describe never fails");
        assert!(desc.is_missing());
        sim.cancel("missing-1").await.expect("cancel is best effort");
    }

    #[tokio::test]
    async fn auto_complete_finishes_immediately() {
        let sim = Arc::new(SimScheduler::new("default"));
        let runner = runner_with(&sim);

        let handle = runner
            .run(&app(), BACKEND, &RunConfig::new().with("auto_complete", true))
            .await
            .expect("run should succeed");

        let desc = runner
            .wait(&handle.to_string(), std::time::Duration::from_millis(1))
            .await
            .expect("wait");
        assert_eq!(desc.state, AppState::Succeeded);
    }

    #[tokio::test]
    async fn launch_line_has_macros_applied() {
        let sim = Arc::new(SimScheduler::new("default"));
        let runner = runner_with(&sim);
        let handle = runner
            .run(&app(), BACKEND, &RunConfig::new())
            .await
            .expect("run should succeed");

        let lines: Vec<_> = runner
            .log_lines(&handle.to_string(), "echo", 1, &LogQuery::new())
            .await
            .expect("log stream")
            .collect()
            .await;

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].as_deref().ok(), Some("launching /bin/echo hello 1"));
    }

    #[tokio::test]
    async fn tailer_follows_until_job_finishes() {
        let sim = Arc::new(SimScheduler::new("default"));
        let runner = runner_with(&sim);
        let handle = runner
            .run(&app(), BACKEND, &RunConfig::new())
            .await
            .expect("run should succeed");
        let app_id = handle.app_id.clone();

        let driver = Arc::clone(&sim);
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            for replica in 0..2 {
                driver
                    .push_log(&app_id, "echo", replica, format!("step {replica}"))
                    .expect("replica exists");
            }
            driver.set_state(&app_id, AppState::Succeeded).expect("job exists");
        });

        let target: LogTarget = format!("{handle}/echo").parse().expect("valid target");
        let mut out = Vec::new();
        LogTailer::new(runner)
            .tail(&target, Some("step.*"), true, &mut out, CancellationToken::new())
            .await
            .expect("tail should succeed");

        let mut lines: Vec<String> = String::from_utf8(out)
            .expect("utf-8")
            .lines()
            .map(str::to_string)
            .collect();
        lines.sort();
        assert_eq!(lines, vec!["echo/0 step 0", "echo/1 step 1"]);
    }

    #[tokio::test]
    async fn failed_replica_is_reported_after_siblings() {
        let sim = Arc::new(SimScheduler::new("default"));
        let runner = runner_with(&sim);
        let handle = runner
            .run(&app(), BACKEND, &RunConfig::new())
            .await
            .expect("run should succeed");

        sim.fail_logs(&handle.app_id, "echo", 0, "node lost").expect("replica exists");
        sim.close_logs(&handle.app_id, "echo", 1).expect("replica exists");

        let target: LogTarget = format!("{handle}/echo").parse().expect("valid target");
        let mut out = Vec::new();
        let res = LogTailer::new(runner)
            .tail(&target, None, true, &mut out, CancellationToken::new())
            .await;

        match res {
            Err(CoreError::ReplicaLogs { replica_id, .. }) => assert_eq!(replica_id, 0),
            other => panic!("expected ReplicaLogs, got {other:?}"),
        }
        let text = String::from_utf8(out).expect("utf-8");
        assert!(text.contains("echo/1 launching /bin/echo hello 1"), "{text}");
    }

    #[test]
    fn controls_reject_unknown_app() {
        let sim = SimScheduler::new("default");
        match sim.set_state("nope", AppState::Running) {
            Err(SimError::UnknownApp(id)) => assert_eq!(id, "nope"),
            other => panic!("expected UnknownApp, got {other:?}"),
        }
    }
}
