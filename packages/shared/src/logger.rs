//! Logging setup shared by the server and client binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// The filter covers the calling crate and the binary. `RUST_LOG` overrides
/// it entirely when set.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "missionlink-server")
/// * `crate_name` - The library crate the binary drives (e.g., "missionlink_server")
/// * `default_log_level` - The default log level (e.g., "debug", "info")
///
/// # Examples
///
/// ```no_run
/// use missionlink_shared::logger::setup_logger;
///
/// setup_logger("missionlink-server", "missionlink_server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, crate_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, crate_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the default `EnvFilter` directive string.
fn default_filter(binary_name: &str, crate_name: &str, level: &str) -> String {
    format!(
        "{}={},{}={},{}={}",
        crate_name,
        level,
        binary_name.replace('-', "_"),
        level,
        env!("CARGO_PKG_NAME").replace('-', "_"),
        level
    )
}
