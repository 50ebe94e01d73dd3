//! In-memory job table and per-replica log buffers.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use fleet_core::{error::SchedulerError, scheduler::LogStream};
use fleet_model::{AppDef, AppState};
use futures::{StreamExt, stream};
use time::OffsetDateTime;
use tokio::sync::watch;

use crate::{error::SimError, request::SimRequest};

struct LogLine {
    at: OffsetDateTime,
    text: String,
}

pub(crate) struct ReplicaLog {
    lines: Vec<LogLine>,
    closed: bool,
    failure: Option<String>,
    changes: watch::Sender<u64>,
}

impl ReplicaLog {
    fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            lines: Vec::new(),
            closed: false,
            failure: None,
            changes,
        }
    }

    pub(crate) fn push(&mut self, text: String) {
        if self.closed {
            return;
        }
        self.lines.push(LogLine {
            at: OffsetDateTime::now_utc(),
            text,
        });
        self.notify();
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
        self.notify();
    }

    pub(crate) fn fail(&mut self, reason: String) {
        self.failure = Some(reason);
        self.closed = true;
        self.notify();
    }

    fn notify(&self) {
        self.changes.send_modify(|v| *v = v.wrapping_add(1));
    }
}

pub(crate) struct SimJob {
    pub app: AppDef,
    pub request: SimRequest,
    pub state: AppState,
    pub msg: String,
    logs: HashMap<(String, u32), ReplicaLog>,
}

impl SimJob {
    pub(crate) fn new(app: AppDef, request: SimRequest) -> Self {
        let mut logs = HashMap::new();
        for task in &request.tasks {
            let mut log = ReplicaLog::new();
            log.push(task.launch_line());
            logs.insert((task.role.clone(), task.replica_id), log);
        }
        Self {
            app,
            request,
            state: AppState::Submitted,
            msg: String::new(),
            logs,
        }
    }

    /// Move to `state`; terminal states close every log stream.
    pub(crate) fn transition(&mut self, state: AppState) {
        self.state = state;
        if state.is_terminal() {
            self.logs.values_mut().for_each(ReplicaLog::close);
        }
    }

    pub(crate) fn replica(
        &mut self,
        app_id: &str,
        role: &str,
        replica_id: u32,
    ) -> Result<&mut ReplicaLog, SimError> {
        self.logs
            .get_mut(&(role.to_string(), replica_id))
            .ok_or_else(|| SimError::UnknownReplica {
                app_id: app_id.to_string(),
                role: role.to_string(),
                replica_id,
            })
    }
}

/// Shared job table of one simulated backend instance.
#[derive(Clone, Default)]
pub(crate) struct JobStore {
    jobs: Arc<Mutex<HashMap<String, SimJob>>>,
}

impl JobStore {
    pub(crate) fn lock(&self) -> MutexGuard<'_, HashMap<String, SimJob>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn with_job<T>(
        &self,
        app_id: &str,
        f: impl FnOnce(&mut SimJob) -> Result<T, SimError>,
    ) -> Result<T, SimError> {
        let mut jobs = self.lock();
        let job = jobs
            .get_mut(app_id)
            .ok_or_else(|| SimError::UnknownApp(app_id.to_string()))?;
        f(job)
    }

    /// Stream the log of one replica starting from its first line.
    ///
    /// With `follow`, the stream waits for new lines until the replica's log is
    /// closed; otherwise it ends at the last line present when it is polled.
    pub(crate) fn open(
        &self,
        app_id: &str,
        role: &str,
        replica_id: u32,
        follow: bool,
        since: Option<OffsetDateTime>,
        until: Option<OffsetDateTime>,
    ) -> Result<LogStream, SimError> {
        let changes = self.with_job(app_id, |job| {
            Ok(job.replica(app_id, role, replica_id)?.changes.subscribe())
        })?;

        let cursor = Cursor {
            store: self.clone(),
            app_id: app_id.to_string(),
            role: role.to_string(),
            replica_id,
            follow,
            since,
            until,
            next: 0,
            changes,
            done: false,
        };
        Ok(stream::unfold(cursor, Cursor::advance).boxed())
    }
}

enum Step {
    Line(String),
    Failed(String),
    Closed,
    Wait,
}

struct Cursor {
    store: JobStore,
    app_id: String,
    role: String,
    replica_id: u32,
    follow: bool,
    since: Option<OffsetDateTime>,
    until: Option<OffsetDateTime>,
    next: usize,
    changes: watch::Receiver<u64>,
    done: bool,
}

impl Cursor {
    async fn advance(mut self) -> Option<(Result<String, SchedulerError>, Self)> {
        loop {
            if self.done {
                return None;
            }
            self.changes.borrow_and_update();

            match self.step() {
                Step::Line(line) => return Some((Ok(line), self)),
                Step::Failed(reason) => {
                    self.done = true;
                    return Some((Err(SchedulerError::Logs(reason)), self));
                }
                Step::Closed => return None,
                Step::Wait if !self.follow => return None,
                Step::Wait => {
                    if self.changes.changed().await.is_err() {
                        return None;
                    }
                }
            }
        }
    }

    fn step(&mut self) -> Step {
        let jobs = self.store.lock();
        let Some(log) = jobs
            .get(&self.app_id)
            .and_then(|job| job.logs.get(&(self.role.clone(), self.replica_id)))
        else {
            return Step::Closed;
        };

        while let Some(line) = log.lines.get(self.next) {
            self.next += 1;
            let after_since = self.since.is_none_or(|s| line.at >= s);
            let before_until = self.until.is_none_or(|u| line.at < u);
            if after_since && before_until {
                return Step::Line(line.text.clone());
            }
        }

        if let Some(reason) = &log.failure {
            return Step::Failed(reason.clone());
        }
        if log.closed {
            Step::Closed
        } else {
            Step::Wait
        }
    }
}
