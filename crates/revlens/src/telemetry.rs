//! Process-wide logging setup.
//!
//! The library logs through the `log` facade; this installs a
//! `tracing-subscriber` pipeline and bridges `log` records into it.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::ConfigError;

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| ConfigError::Logging(format!("invalid filter '{}': {}", config.level, e))),
    }
}

fn install<S>(subscriber: S) -> Result<(), ConfigError>
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ConfigError::Logging(e.to_string()))?;
    tracing_log::LogTracer::init().map_err(|e| ConfigError::Logging(e.to_string()))
}

/// Installs the global subscriber. Fails instead of panicking when a
/// subscriber or logger is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Text => install(registry.with(fmt::layer().with_target(true))),
        LogFormat::Json => install(registry.with(fmt::layer().json().with_current_span(true))),
    }
}
