//! `fleetctl`: submit, inspect, cancel and tail apps through the runner.
//!
//! Exit status is `0` on success, `2` when the input was rejected (malformed
//! handle or log target, invalid run config, unknown role or backend) and `1`
//! for every other failure.
pub mod commands;

use std::{io::Write, sync::Arc};

use clap::{Parser, Subcommand};
use tracing::debug;

use fleet_core::{error::CoreError, registry::SchedulerRegistry, runner::Runner};
use fleet_model::{DEFAULT_SESSION, ModelError};
use fleet_observe::{LoggerConfig, LoggerError, LoggerFormat, LoggerLevel, init_logger};
use fleet_prometheus::PrometheusMetrics;
use fleet_sim::register_sim_scheduler;

#[derive(Debug, Parser)]
#[command(name = "fleetctl", version, about = "Scheduler-agnostic job launcher")]
pub struct Cli {
    /// Session name used in app handles.
    #[arg(long, global = true, default_value = DEFAULT_SESSION)]
    pub session: String,

    /// Diagnostic log format: text, json or journald.
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LoggerFormat,

    /// Diagnostic log filter, e.g. `info` or `fleet_core=debug,warn`.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: LoggerLevel,

    /// Print collected metrics to stderr before exiting.
    #[arg(long, global = true)]
    pub print_metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a built-in component on a scheduler.
    Run(commands::run::RunArgs),
    /// Show the status of an app.
    Status(commands::status::StatusArgs),
    /// Cancel an app.
    Cancel(commands::cancel::CancelArgs),
    /// Print the logs of one or more replicas of a role.
    Log(commands::log::LogArgs),
    /// List the run options a scheduler accepts.
    Runopts(commands::runopts::RunoptsArgs),
    /// List the built-in components.
    Builtins,
}

/// Shared state handed to every command.
pub struct Context {
    pub runner: Arc<Runner>,
    pub metrics: Option<PrometheusMetrics>,
}

impl Context {
    /// Runner with every known backend registered.
    pub fn new(session: &str) -> Self {
        let mut registry = SchedulerRegistry::new();
        register_sim_scheduler(&mut registry);

        let metrics = match PrometheusMetrics::new() {
            Ok(m) => Some(m),
            Err(e) => {
                debug!(error = %e, "metrics disabled");
                None
            }
        };
        let mut runner = Runner::new(session, registry);
        if let Some(m) = &metrics {
            runner = runner.with_metrics(Arc::new(m.clone()));
        }

        Self {
            runner: Arc::new(runner),
            metrics,
        }
    }
}

pub fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    init_logger(&LoggerConfig {
        format: cli.log_format,
        level: cli.log_level.clone(),
        ..Default::default()
    })?;
    Ok(())
}

/// Run the selected command, writing its output to `out`.
pub async fn execute<W>(cli: Cli, out: &mut W) -> anyhow::Result<()>
where
    W: Write + ?Sized,
{
    let ctx = Context::new(&cli.session);

    let res = match cli.command {
        Commands::Run(args) => commands::run::execute(&ctx, args, out).await,
        Commands::Status(args) => commands::status::execute(&ctx, args, out).await,
        Commands::Cancel(args) => commands::cancel::execute(&ctx, args, out).await,
        Commands::Log(args) => commands::log::execute(&ctx, args, out).await,
        Commands::Runopts(args) => commands::runopts::execute(&ctx, args, out),
        Commands::Builtins => commands::builtins::execute(out),
    };

    if cli.print_metrics {
        if let Some(text) = ctx.metrics.as_ref().and_then(|m| m.encode_text().ok()) {
            eprint!("{text}");
        }
    }
    res
}

/// Map an error to the process exit status.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<CoreError>() {
            return if e.is_validation() { 2 } else { 1 };
        }
        if cause.is::<ModelError>() || cause.is::<LoggerError>() {
            return 2;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(args: &[&str]) -> (anyhow::Result<()>, String) {
        let cli = Cli::parse_from(std::iter::once("fleetctl").chain(args.iter().copied()));
        let mut out = Vec::new();
        let res = execute(cli, &mut out).await;
        (res, String::from_utf8(out).expect("utf-8 output"))
    }

    #[test]
    fn global_flags_parse_anywhere() {
        let cli = Cli::parse_from([
            "fleetctl",
            "status",
            "sim://default/app-1",
            "--log-level",
            "debug",
            "--session",
            "s1",
        ]);
        assert_eq!(cli.session, "s1");
        assert_eq!(cli.log_level.as_str(), "debug");
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[tokio::test]
    async fn malformed_log_target_exits_with_validation_status() {
        let (res, out) = run(&["log", "sim://default/app-1"]).await;
        let err = res.expect_err("target without role must be rejected");
        assert_eq!(exit_code(&err), 2);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn unknown_scheduler_exits_with_validation_status() {
        let (res, _) = run(&["run", "--scheduler", "kubernetes", "echo"]).await;
        let err = res.expect_err("unknown scheduler must be rejected");
        assert_eq!(exit_code(&err), 2);
    }

    #[tokio::test]
    async fn invalid_scheduler_args_exit_with_validation_status() {
        let (res, _) = run(&["run", "--scheduler-args", "priority=high", "echo"]).await;
        let err = res.expect_err("non-integer priority must be rejected");
        assert_eq!(exit_code(&err), 2);
    }

    #[tokio::test]
    async fn unknown_app_status_fails() {
        let (res, _) = run(&["status", "sim://default/missing-1"]).await;
        let err = res.expect_err("missing app is an error");
        assert_eq!(exit_code(&err), 1);
    }

    #[tokio::test]
    async fn run_wait_and_log_in_one_invocation() {
        let (res, out) = run(&[
            "run",
            "--scheduler-args",
            "auto_complete=true,labels=a;b",
            "--wait",
            "--log",
            "echo",
            "--msg",
            "hello",
            "--num-replicas",
            "2",
        ])
        .await;

        res.expect("run should succeed");
        assert!(out.starts_with("sim://default/echo-"), "{out}");
        assert!(out.contains("echo/0 launching /bin/echo hello"), "{out}");
        assert!(out.contains("echo/1 launching /bin/echo hello"), "{out}");
        assert!(out.contains("state: SUCCEEDED (4)"), "{out}");
    }

    #[tokio::test]
    async fn dryrun_prints_request_without_submitting() {
        let (res, out) = run(&["run", "--dryrun", "touch", "--file", "/tmp/x"]).await;
        res.expect("dryrun should succeed");
        assert!(out.contains("name: touch-0"), "{out}");
        assert!(!out.contains("sim://"), "{out}");
    }

    #[tokio::test]
    async fn runopts_and_builtins_are_listed() {
        let (res, out) = run(&["runopts"]).await;
        res.expect("runopts should succeed");
        assert!(out.contains("sim:"), "{out}");
        assert!(out.contains("auto_complete"), "{out}");

        let (res, out) = run(&["builtins"]).await;
        res.expect("builtins should succeed");
        assert!(out.contains("echo") && out.contains("touch") && out.contains("sh"));
    }
}
