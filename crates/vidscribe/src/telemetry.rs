//! Process-wide logging setup.
//!
//! Library code logs through the `log` facade; this bridges those records
//! into a `tracing` subscriber with either plain or JSON output.

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

use crate::config::LoggingConfig;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Logging already initialised: {0}")]
    AlreadyInitialised(String),
}

/// Installs the global subscriber. `RUST_LOG` overrides the configured level.
///
/// Fails on a second call instead of panicking.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;

    let subscriber = Registry::default()
        .with(filter)
        .with(config.json.then(|| fmt::layer().json().with_target(true)))
        .with((!config.json).then(|| fmt::layer().with_target(false)));

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| TelemetryError::AlreadyInitialised(e.to_string()))?;
    tracing_log::LogTracer::init().map_err(|e| TelemetryError::AlreadyInitialised(e.to_string()))?;

    log::debug!(
        "Logging initialised (level={}, json={})",
        config.level,
        config.json
    );
    Ok(())
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| TelemetryError::InvalidFilter {
        filter: config.level.clone(),
        reason: e.to_string(),
    })
}
