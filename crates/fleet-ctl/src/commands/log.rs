//! `fleetctl log`: print replica logs, optionally following them until Ctrl-C.
use std::io::{IsTerminal, Write};

use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use fleet_core::logs::LogTailer;
use fleet_model::LogTarget;

use crate::Context;

#[derive(Debug, Args)]
pub struct LogArgs {
    /// `{scheduler}://{session}/{app_id}/{role}[/{replica_id},...]`.
    pub identifier: String,

    /// Only print lines matching this pattern in full.
    #[arg(short, long)]
    pub regex: Option<String>,

    /// Keep following the logs until the replicas finish.
    #[arg(short, long)]
    pub tail: bool,
}

pub async fn execute<W>(ctx: &Context, args: LogArgs, out: &mut W) -> anyhow::Result<()>
where
    W: Write + ?Sized,
{
    let target: LogTarget = args.identifier.parse()?;
    let tailer = LogTailer::new(ctx.runner.clone()).with_color(std::io::stdout().is_terminal());

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let signal = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                debug!("interrupted, stopping log workers");
                on_signal.cancel();
            }
            Err(e) => warn!(error = %e, "cannot listen for ctrl-c"),
        }
    });

    let res = tailer
        .tail(&target, args.regex.as_deref(), args.tail, out, cancel)
        .await;
    signal.abort();
    res?;
    Ok(())
}
