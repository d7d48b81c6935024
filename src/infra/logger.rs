// src/infra/logger.rs - Structured logging with tracing

use tracing_subscriber::{fmt, EnvFilter};

use crate::infra::config::LogFormat;

/// Install the global subscriber. `MATCALC_LOG` wins over `RUST_LOG`, which
/// wins over the configured level.
pub fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_env("MATCALC_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level));

    // try_init: a second call (tests, embedding) keeps the first subscriber
    let result = match format {
        LogFormat::Json => fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
            .try_init(),
        LogFormat::Compact => fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init(),
    };

    if let Err(e) = result {
        tracing::debug!("logging already initialised: {}", e);
    }
}
