//! Pedal monitoring daemon (pedalwatchd)

use std::process::ExitCode;

use clap::Parser;
use pedalwatch_errors::PedalWatchError;
use pedalwatch_service::{Args, DaemonConfig, daemon, exit_code, init_logging};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(args.verbose) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    let result = match DaemonConfig::from_args(&args) {
        Ok(config) => daemon::run(config).await,
        Err(e) => {
            Err(anyhow::Error::new(PedalWatchError::from(e)).context("invalid configuration"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}
