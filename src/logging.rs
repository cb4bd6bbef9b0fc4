use std::env;
use std::io;
use std::sync::OnceLock;

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter, e.g. `todowall=debug`.
pub const LOG_ENV_VAR: &str = "TODOWALL_LOG";

static INSTALLED: OnceLock<()> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid logging filter: {0}")]
    Filter(#[from] ParseError),
    #[error("failed to install logging subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the stderr subscriber. The first call wins; later calls are no-ops.
///
/// The filter comes from `TODOWALL_LOG`, then `RUST_LOG`, then from the
/// number of `-v` flags.
pub fn init_logging(verbosity: u8) -> Result<(), LoggingError> {
    if INSTALLED.get().is_some() {
        return Ok(());
    }

    let filter = build_filter(verbosity)?;
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .try_init()?;

    let _ = INSTALLED.set(());
    Ok(())
}

fn build_filter(verbosity: u8) -> Result<EnvFilter, ParseError> {
    for var in &[LOG_ENV_VAR, "RUST_LOG"] {
        if let Ok(directives) = env::var(var) {
            if !directives.trim().is_empty() {
                return EnvFilter::try_new(directives);
            }
        }
    }
    EnvFilter::try_new(level_for(verbosity))
}

fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
