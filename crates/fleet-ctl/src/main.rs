use std::process::ExitCode;

use clap::Parser;

use fleet_ctl::{Cli, exit_code};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = fleet_ctl::init_logging(&cli) {
        eprintln!("error: {e:#}");
        return ExitCode::from(exit_code(&e));
    }

    let mut stdout = std::io::stdout().lock();
    match fleet_ctl::execute(cli, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}
