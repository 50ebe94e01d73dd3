use std::io::Write;

use clap::Args;

use crate::Context;

#[derive(Debug, Args)]
pub struct RunoptsArgs {
    /// Only list the options of this backend.
    pub scheduler: Option<String>,
}

pub fn execute<W>(ctx: &Context, args: RunoptsArgs, out: &mut W) -> anyhow::Result<()>
where
    W: Write + ?Sized,
{
    let backends = match args.scheduler {
        Some(name) => vec![name],
        None => ctx.runner.scheduler_backends(),
    };
    for backend in backends {
        let opts = ctx.runner.run_opts(&backend)?;
        writeln!(out, "{backend}:\n{opts}")?;
    }
    Ok(())
}
