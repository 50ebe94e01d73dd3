use std::io::Write;

use anyhow::bail;
use clap::Args;

use crate::Context;

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// App handle, `{scheduler}://{session}/{app_id}`.
    pub app_handle: String,

    /// Only show the statuses of these roles.
    #[arg(long, value_delimiter = ',')]
    pub roles: Vec<String>,
}

pub async fn execute<W>(ctx: &Context, args: StatusArgs, out: &mut W) -> anyhow::Result<()>
where
    W: Write + ?Sized,
{
    let desc = ctx.runner.status(&args.app_handle).await?;
    if desc.is_missing() {
        bail!("app {} does not exist", args.app_handle);
    }

    let mut status = desc.status();
    if !args.roles.is_empty() {
        status.roles.retain(|r| args.roles.contains(&r.role));
    }
    write!(out, "{status}")?;
    Ok(())
}
