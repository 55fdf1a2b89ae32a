//! Tracing setup for the scheduler binary.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the process-wide tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set. Runs carry their
/// context as event fields (`job`, `run_id`, `checkpoint`), not spans, so
/// no span formatting is configured.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = fmt().with_env_filter(filter);

    match config.format.as_str() {
        "json" => builder.json().init(),
        _ => builder.pretty().init(),
    }
}
