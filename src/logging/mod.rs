// Logging module for structured logging using the tracing crate

use std::error::Error;
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Build the event filter: `RUST_LOG` when set, otherwise `default_level`.
pub fn build_filter(default_level: &str) -> Result<EnvFilter, Box<dyn Error + Send + Sync>> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(default_level)?),
    }
}

/// Initialize the tracing subscriber for structured logging
///
/// JSON output suits log aggregation; `Pretty` is meant for terminals.
/// Events go to stderr so stdout stays free for command output.
///
/// # Errors
///
/// Returns an error if `default_level` is not a valid filter directive or a
/// global subscriber is already installed.
///
/// # Examples
///
/// ```
/// use image_marker::config::LogFormat;
/// use image_marker::logging::init_subscriber;
///
/// init_subscriber(LogFormat::Json, "info").expect("Failed to initialize logging");
///
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(format: LogFormat, default_level: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = build_filter(default_level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    }
}
