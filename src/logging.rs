// Logging setup - tracing fmt subscriber with an env filter
// RUST_LOG wins over the configured default.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed (the host
/// application's, or a previous call), leaving that one in place.
pub fn init(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
