//! Tracing subscriber setup for the daemon.

use anyhow::{Context, Result};

/// Default filter directive for a `-v` count.
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_logging(verbose: u8) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_unset) => EnvFilter::try_new(level_for_verbosity(verbose))?,
    };

    let fmt_layer = fmt::layer().with_target(true).with_thread_names(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("failed to initialize logging")?;

    Ok(())
}
