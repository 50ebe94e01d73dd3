//! `fleetctl run`: build a component, submit it and optionally wait or tail.
use std::{io::Write, time::Duration};

use anyhow::{Context as _, bail};
use clap::{Args, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use fleet_core::logs::LogTailer;
use fleet_model::{AppDef, AppHandle, AppState, LogTarget, RunConfig, components};

use crate::Context;

const DEFAULT_IMAGE: &str = "/tmp";

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Backend to submit to.
    #[arg(short, long, default_value = "sim")]
    pub scheduler: String,

    /// Scheduler options as `key=value` pairs separated by commas.
    #[arg(short = 'c', long, default_value = "")]
    pub scheduler_args: String,

    /// Print the request that would be submitted and exit.
    #[arg(long)]
    pub dryrun: bool,

    /// Block until the app reaches a terminal state.
    #[arg(long)]
    pub wait: bool,

    /// Stream the logs of every role to stdout.
    #[arg(long)]
    pub log: bool,

    /// Seconds between status polls while waiting.
    #[arg(long, default_value_t = 1.0)]
    pub poll_interval: f64,

    #[command(subcommand)]
    pub component: Component,
}

#[derive(Debug, Subcommand)]
pub enum Component {
    /// Echo a message.
    Echo {
        #[arg(long, default_value = "hello world")]
        msg: String,
        #[arg(long, default_value = DEFAULT_IMAGE)]
        image: String,
        #[arg(long, default_value_t = 1)]
        num_replicas: u32,
    },
    /// Touch a file.
    Touch {
        #[arg(long)]
        file: String,
    },
    /// Run a shell command.
    Sh {
        #[arg(long, default_value = DEFAULT_IMAGE)]
        image: String,
        #[arg(long, default_value_t = 1)]
        num_replicas: u32,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },
}

impl Component {
    pub fn app_def(&self) -> AppDef {
        match self {
            Component::Echo {
                msg,
                image,
                num_replicas,
            } => components::echo(msg, image, *num_replicas),
            Component::Touch { file } => components::touch(file),
            Component::Sh {
                image,
                num_replicas,
                args,
            } => components::sh(args, image, *num_replicas),
        }
    }
}

pub async fn execute<W>(ctx: &Context, args: RunArgs, out: &mut W) -> anyhow::Result<()>
where
    W: Write + ?Sized,
{
    let runner = &ctx.runner;
    let app = args.component.app_def();
    let cfg: RunConfig = runner
        .run_opts(&args.scheduler)?
        .parse_cfg(&args.scheduler_args)?;

    if args.dryrun {
        let info = runner.dryrun(&app, &args.scheduler, &cfg)?;
        writeln!(out, "=== APPLICATION ===\n{app:#?}\n=== SCHEDULER REQUEST ===\n{info}")?;
        return Ok(());
    }

    let handle = runner.run(&app, &args.scheduler, &cfg).await?;
    writeln!(out, "{handle}")?;
    info!(%handle, "launched app");

    if args.log {
        tail_roles(ctx, &handle, &app, out).await?;
    }

    if args.wait {
        let interval = Duration::try_from_secs_f64(args.poll_interval)
            .context("invalid --poll-interval")?;
        let desc = runner.wait(&handle.to_string(), interval).await?;
        write!(out, "{}", desc.status())?;
        if desc.state != AppState::Succeeded {
            bail!("app {handle} finished in state {}", desc.state);
        }
    }
    Ok(())
}

async fn tail_roles<W>(ctx: &Context, handle: &AppHandle, app: &AppDef, out: &mut W) -> anyhow::Result<()>
where
    W: Write + ?Sized,
{
    let tailer = LogTailer::new(ctx.runner.clone());
    for role in &app.roles {
        let target = LogTarget {
            backend: handle.backend.clone(),
            session: handle.session.clone(),
            app_id: handle.app_id.clone(),
            role: role.name.clone(),
            replica_ids: None,
        };
        tailer
            .tail(&target, None, true, out, CancellationToken::new())
            .await?;
    }
    Ok(())
}
