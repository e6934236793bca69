//! # Logging
//!
//! Installs the global `tracing` subscriber: a console layer plus a plain-text
//! session log written through a non-blocking file appender.
//! The returned guard must be held until exit or buffered lines are lost.

use anyhow::{Context, Result};
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::domain::config::LoggingConfig;
use crate::strings::logs;

/// Used when neither `RUST_LOG` nor `logging.filter` is set.
pub const DEFAULT_FILTER: &str =
    "info,matrix_sdk=warn,matrix_sdk_base=warn,matrix_sdk_crypto=error,ruma=warn,hyper=warn";

/// Filter directives from the config, falling back to [`DEFAULT_FILTER`].
pub fn filter_directives(config: &LoggingConfig) -> &str {
    config
        .filter
        .as_deref()
        .filter(|filter| !filter.trim().is_empty())
        .unwrap_or(DEFAULT_FILTER)
}

pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
    fs::create_dir_all(&config.directory).with_context(|| {
        format!("Failed to create log directory {}", config.directory.display())
    })?;

    // Each session starts with a fresh log
    let log_path = config.directory.join(&config.file);
    if log_path.exists() {
        let _ = fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(&config.directory, &config.file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context(logs::LOGGING_INIT_ERROR)?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_falls_back_to_default() {
        let mut config = LoggingConfig::default();
        assert_eq!(filter_directives(&config), DEFAULT_FILTER);

        config.filter = Some("  ".to_string());
        assert_eq!(filter_directives(&config), DEFAULT_FILTER);

        config.filter = Some("debug".to_string());
        assert_eq!(filter_directives(&config), "debug");
    }
}
