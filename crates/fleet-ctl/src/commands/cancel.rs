use std::io::Write;

use clap::Args;

use crate::Context;

#[derive(Debug, Args)]
pub struct CancelArgs {
    /// App handle, `{scheduler}://{session}/{app_id}`.
    pub app_handle: String,
}

pub async fn execute<W>(ctx: &Context, args: CancelArgs, out: &mut W) -> anyhow::Result<()>
where
    W: Write + ?Sized,
{
    ctx.runner.cancel(&args.app_handle).await?;
    writeln!(out, "cancel requested for {}", args.app_handle)?;
    Ok(())
}
