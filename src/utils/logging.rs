//! Logging initialisation for binaries embedding the engine.
//!
//! The library itself only emits `tracing` events; installing a
//! subscriber is left to the host.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable consulted when `RUST_LOG` is not set
pub const LOG_LEVEL_ENV: &str = "BEACON_LOG_LEVEL";

/// Build the filter from `RUST_LOG`, then `BEACON_LOG_LEVEL`, then `info`
pub fn env_filter() -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    let log_level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_string());
    EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))
}

/// Install a compact stderr subscriber.
///
/// # Errors
///
/// Returns an error if the filter directive cannot be parsed.
pub fn init() -> Result<(), tracing_subscriber::filter::ParseError> {
    let filter = env_filter()?;

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(env_filter().is_ok());
    }
}
