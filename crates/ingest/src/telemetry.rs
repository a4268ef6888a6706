use model::Error;
use model::env::LogLevel;
use tracing_subscriber::EnvFilter;

/// Install a JSON log subscriber for the function.
///
/// `RUST_LOG` takes precedence over the configured level when set.
/// Timestamps are left to the Lambda log stream.
pub fn init_subscriber(log_level: LogLevel) -> Result<(), Error> {
    let filter: EnvFilter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.filter_directive()));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .with_target(false)
        .without_time()
        .try_init()
}
