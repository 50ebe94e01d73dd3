//! Concurrent log collection across the replicas of one role.
//!
//! One worker task is spawned per replica. Workers forward prefixed lines to a
//! single writer over a bounded channel and report failures over a second
//! channel, which is drained once every worker has finished. A failing replica
//! never stops its siblings.
use std::{io::Write, sync::Arc};

use fleet_model::{AppHandle, LogTarget};
use futures::StreamExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, trace};

use crate::{
    error::{CoreError, CoreResult},
    runner::Runner,
    scheduler::{LogQuery, line_filter},
};

const LINE_BUFFER: usize = 1024;

const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Fans log requests out to every targeted replica and merges their output.
pub struct LogTailer {
    runner: Arc<Runner>,
    color: bool,
}

impl LogTailer {
    pub fn new(runner: Arc<Runner>) -> Self {
        Self {
            runner,
            color: false,
        }
    }

    /// Wrap the `{role}/{replica_id}` prefix in ANSI green.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Write `"{role}/{replica_id} {line}"` to `out` for every line of every targeted replica.
    ///
    /// Without explicit replica ids in `target`, the app is described and every
    /// replica of the role is read. Returns once all workers have finished; if
    /// any of them failed, the failure of the earliest started worker is
    /// returned and the others are logged. Cancelling `cancel` stops all
    /// workers, including ones following a stream with `should_tail`.
    #[instrument(level = "debug", skip(self, target, out, cancel), fields(target = %target))]
    pub async fn tail<W>(
        &self,
        target: &LogTarget,
        regex: Option<&str>,
        should_tail: bool,
        out: &mut W,
        cancel: CancellationToken,
    ) -> CoreResult<()>
    where
        W: Write + ?Sized,
    {
        if let Some(pattern) = regex {
            line_filter(pattern)?;
        }

        let handle = target.app_handle();
        let replica_ids = match &target.replica_ids {
            Some(ids) => ids.clone(),
            None => self.replica_range(&handle, &target.role).await?,
        };
        debug!(replicas = ?replica_ids, "starting log workers");

        let query = LogQuery::new().with_regex(regex).tail(should_tail);
        let stop = cancel.child_token();
        let (line_tx, mut line_rx) = mpsc::channel::<String>(LINE_BUFFER);
        let (err_tx, mut err_rx) = mpsc::unbounded_channel::<(usize, CoreError)>();

        let mut workers: Vec<(usize, u32, JoinHandle<()>)> = Vec::with_capacity(replica_ids.len());
        for (idx, replica_id) in replica_ids.into_iter().enumerate() {
            let worker = ReplicaWorker {
                runner: Arc::clone(&self.runner),
                handle: handle.clone(),
                role: target.role.clone(),
                replica_id,
                prefix: self.prefix(&target.role, replica_id),
                query: query.clone(),
                lines: line_tx.clone(),
                cancel: stop.clone(),
            };
            let errors = err_tx.clone();
            let task = tokio::spawn(async move {
                if let Err(e) = worker.run().await {
                    let _ = errors.send((idx, e));
                }
            });
            workers.push((idx, replica_id, task));
        }
        drop(line_tx);
        drop(err_tx);

        let mut write_err = None;
        while let Some(line) = line_rx.recv().await {
            if write_err.is_some() {
                continue;
            }
            if let Err(e) = writeln!(out, "{line}") {
                write_err = Some(e);
                stop.cancel();
            }
        }

        let mut failures = Vec::new();
        for (idx, replica_id, task) in workers {
            if let Err(e) = task.await {
                failures.push((
                    idx,
                    CoreError::Worker {
                        role: target.role.clone(),
                        replica_id,
                        reason: e.to_string(),
                    },
                ));
            }
        }
        while let Ok(failure) = err_rx.try_recv() {
            failures.push(failure);
        }
        failures.sort_by_key(|(idx, _)| *idx);

        if let Some(e) = write_err {
            for (_, failure) in &failures {
                error!(error = %failure, "log worker failed");
            }
            return Err(e.into());
        }
        out.flush()?;

        let mut failures = failures.into_iter().map(|(_, e)| e);
        let Some(first) = failures.next() else {
            return Ok(());
        };
        for secondary in failures {
            error!(error = %secondary, "log worker failed");
        }
        Err(first)
    }

    async fn replica_range(&self, handle: &AppHandle, role: &str) -> CoreResult<Vec<u32>> {
        let desc = self.runner.status(&handle.to_string()).await?;
        match desc.role(role) {
            Some(r) => Ok((0..r.num_replicas).collect()),
            None => Err(CoreError::UnknownRole {
                role: role.to_string(),
                app: handle.to_string(),
                valid: desc.role_names(),
            }),
        }
    }

    fn prefix(&self, role: &str, replica_id: u32) -> String {
        if self.color {
            format!("{GREEN}{role}/{replica_id}{RESET}")
        } else {
            format!("{role}/{replica_id}")
        }
    }
}

struct ReplicaWorker {
    runner: Arc<Runner>,
    handle: AppHandle,
    role: String,
    replica_id: u32,
    prefix: String,
    query: LogQuery,
    lines: mpsc::Sender<String>,
    cancel: CancellationToken,
}

impl ReplicaWorker {
    async fn run(self) -> CoreResult<()> {
        let handle = self.handle.to_string();
        let opened = tokio::select! {
            _ = self.cancel.cancelled() => return Ok(()),
            opened = self.runner.log_lines(&handle, &self.role, self.replica_id, &self.query) => opened,
        };
        let mut stream = opened.map_err(|e| self.wrap(e))?;

        let mut delivered = 0u64;
        let res = loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    trace!(replica_id = self.replica_id, "log worker cancelled");
                    break Ok(());
                }
                next = stream.next() => next,
            };
            match next {
                None => break Ok(()),
                Some(Ok(line)) => {
                    let line = format!("{} {}", self.prefix, line.trim_end_matches(['\r', '\n']));
                    if self.lines.send(line).await.is_err() {
                        break Ok(());
                    }
                    delivered += 1;
                }
                Some(Err(e)) => {
                    break Err(CoreError::ReplicaLogs {
                        role: self.role.clone(),
                        replica_id: self.replica_id,
                        source: e,
                    });
                }
            }
        };

        self.runner
            .metrics()
            .record_log_lines(&self.handle.backend, delivered);
        res
    }

    fn wrap(&self, e: CoreError) -> CoreError {
        match e {
            CoreError::Scheduler(source) => CoreError::ReplicaLogs {
                role: self.role.clone(),
                replica_id: self.replica_id,
                source,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::SchedulerError,
        testing::{FakeScheduler, registry_with},
    };

    use std::{sync::atomic::Ordering, time::Duration};

    use fleet_model::{AppDef, AppState, Role};

    fn lines_of(replica: u32) -> Vec<String> {
        ["a", "b", "c"]
            .iter()
            .map(|s| format!("line-{replica}-{s}"))
            .collect()
    }

    fn fake() -> FakeScheduler {
        let app = AppDef::new("app").with_role(Role::new("trainer", "img").with_replicas(3));
        let mut fake = FakeScheduler::new("fake", "default").with_app("app", app, AppState::Running);
        for replica in 0..3 {
            let lines = lines_of(replica);
            let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
            fake = fake.with_lines("trainer", replica, &refs);
        }
        fake
    }

    fn tailer(fake: &Arc<FakeScheduler>) -> LogTailer {
        LogTailer::new(Arc::new(Runner::new("default", registry_with(fake))))
    }

    fn target(s: &str) -> LogTarget {
        s.parse().expect("valid log target")
    }

    fn sorted_output(out: Vec<u8>) -> Vec<String> {
        let mut lines: Vec<String> = String::from_utf8(out)
            .expect("utf-8 output")
            .lines()
            .map(str::to_string)
            .collect();
        lines.sort();
        lines
    }

    #[tokio::test]
    async fn tail_reads_every_replica_with_filter() {
        let fake = Arc::new(fake());
        let mut out = Vec::new();

        tailer(&fake)
            .tail(
                &target("fake://default/app/trainer"),
                Some(r"line-\d-b"),
                false,
                &mut out,
                CancellationToken::new(),
            )
            .await
            .expect("tail should succeed");

        assert_eq!(
            sorted_output(out),
            vec![
                "trainer/0 line-0-b",
                "trainer/1 line-1-b",
                "trainer/2 line-2-b"
            ]
        );
    }

    #[tokio::test]
    async fn tail_reads_only_requested_replicas() {
        let fake = Arc::new(fake());
        let mut out = Vec::new();

        tailer(&fake)
            .tail(
                &target("fake://default/app/trainer/0,2"),
                None,
                false,
                &mut out,
                CancellationToken::new(),
            )
            .await
            .expect("tail should succeed");

        let lines = sorted_output(out);
        assert_eq!(lines.len(), 6);
        assert!(lines.iter().all(|l| !l.starts_with("trainer/1 ")));
        assert_eq!(fake.describe_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_replica_does_not_hide_siblings() {
        let fake = Arc::new(fake().failing("trainer", 1));
        let mut out = Vec::new();

        let res = tailer(&fake)
            .tail(
                &target("fake://default/app/trainer"),
                None,
                false,
                &mut out,
                CancellationToken::new(),
            )
            .await;

        match res {
            Err(CoreError::ReplicaLogs {
                role,
                replica_id,
                source: SchedulerError::Logs(_),
            }) => {
                assert_eq!(role, "trainer");
                assert_eq!(replica_id, 1);
            }
            other => panic!("expected ReplicaLogs for replica 1, got {other:?}"),
        }

        let lines = sorted_output(out);
        assert_eq!(lines.len(), 9);
        for replica in [0u32, 2] {
            for line in lines_of(replica) {
                assert!(lines.contains(&format!("trainer/{replica} {line}")));
            }
        }
    }

    #[tokio::test]
    async fn first_failure_is_by_start_order() {
        let fake = Arc::new(fake().failing("trainer", 2).failing("trainer", 0));
        let mut out = Vec::new();

        let res = tailer(&fake)
            .tail(
                &target("fake://default/app/trainer/2,0"),
                None,
                false,
                &mut out,
                CancellationToken::new(),
            )
            .await;

        match res {
            Err(CoreError::ReplicaLogs { replica_id, .. }) => assert_eq!(replica_id, 2),
            other => panic!("expected ReplicaLogs, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_role_fails_before_starting_workers() {
        let fake = Arc::new(fake());
        let mut out = Vec::new();

        let res = tailer(&fake)
            .tail(
                &target("fake://default/app/worker"),
                None,
                false,
                &mut out,
                CancellationToken::new(),
            )
            .await;

        match res {
            Err(CoreError::UnknownRole { role, valid, .. }) => {
                assert_eq!(role, "worker");
                assert_eq!(valid, vec!["trainer"]);
            }
            other => panic!("expected UnknownRole, got {other:?}"),
        }
        assert_eq!(fake.log_calls.load(Ordering::SeqCst), 0);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn invalid_regex_fails_before_starting_workers() {
        let fake = Arc::new(fake());
        let mut out = Vec::new();

        let res = tailer(&fake)
            .tail(
                &target("fake://default/app/trainer"),
                Some("(unclosed"),
                false,
                &mut out,
                CancellationToken::new(),
            )
            .await;

        match res {
            Err(CoreError::Scheduler(SchedulerError::InvalidRegex(_))) => {}
            other => panic!("expected InvalidRegex, got {other:?}"),
        }
        assert_eq!(fake.log_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancel_stops_following_workers() {
        let fake = Arc::new(fake().hanging("trainer", 0).hanging("trainer", 1));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let mut out = Vec::new();
        tailer(&fake)
            .tail(
                &target("fake://default/app/trainer"),
                None,
                true,
                &mut out,
                cancel,
            )
            .await
            .expect("cancelled tail completes normally");

        assert_eq!(sorted_output(out).len(), 9);
    }

    #[tokio::test]
    async fn colored_prefix_wraps_role_and_replica() {
        let fake = Arc::new(fake());
        let mut out = Vec::new();

        tailer(&fake)
            .with_color(true)
            .tail(
                &target("fake://default/app/trainer/0"),
                Some("line-0-a"),
                false,
                &mut out,
                CancellationToken::new(),
            )
            .await
            .expect("tail should succeed");

        assert_eq!(
            String::from_utf8(out).expect("utf-8 output"),
            "\x1b[32mtrainer/0\x1b[0m line-0-a\n"
        );
    }
}
