//! Logging initialization for the trading core.
//!
//! Built on `tracing-subscriber`: an `EnvFilter` honoring `RUST_LOG`, with a
//! configurable format and an optional log file. `bypass_logging` installs
//! nothing, for callers embedding the core under their own subscriber.

use std::fs::File;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::TradingError;

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    pub fn from_str(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Install no subscriber at all.
    pub bypass_logging: bool,
    pub format: LogFormat,
    /// Default level for console output (overridden by `RUST_LOG`).
    pub level_console: String,
    /// Default level when writing to a file.
    pub level_file: String,
    /// Emit to the console.
    pub console_prints: bool,
    /// Include thread ids in log lines.
    pub log_thread_id: bool,
    pub log_to_file: bool,
    pub log_file_path: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            bypass_logging: false,
            format: LogFormat::Pretty,
            level_console: "info".to_string(),
            level_file: "debug".to_string(),
            console_prints: true,
            log_thread_id: false,
            log_to_file: false,
            log_file_path: "tradewind.log".to_string(),
        }
    }
}

/// Initialize the global subscriber from the given configuration.
///
/// Fails with `InvalidArgument` if a subscriber is already installed or the
/// log file cannot be created.
pub fn init_logging(config: &LogConfig) -> Result<(), TradingError> {
    if config.bypass_logging || !config.console_prints && !config.log_to_file {
        return Ok(());
    }

    let default_level = if config.log_to_file {
        &config.level_file
    } else {
        &config.level_console
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if config.log_to_file {
        let file = File::create(&config.log_file_path).map_err(|e| {
            TradingError::InvalidArgument(format!(
                "cannot create log file '{}': {e}",
                config.log_file_path
            ))
        })?;
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_thread_ids(config.log_thread_id)
            .with_writer(Mutex::new(file));
        let result = match config.format {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Pretty => builder.try_init(),
        };
        result.map_err(|e| TradingError::InvalidArgument(format!("cannot init logging: {e}")))
    } else {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_thread_ids(config.log_thread_id);
        let result = match config.format {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Pretty => builder.try_init(),
        };
        result.map_err(|e| TradingError::InvalidArgument(format!("cannot init logging: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!(LogFormat::from_str("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::from_str("compact"), LogFormat::Compact);
        assert_eq!(LogFormat::from_str("anything"), LogFormat::Pretty);
    }

    #[test]
    fn bypass_installs_nothing() {
        let config = LogConfig {
            bypass_logging: true,
            ..Default::default()
        };
        assert!(init_logging(&config).is_ok());
        // A second call must also succeed since nothing was installed.
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn default_config_has_console_output() {
        let config = LogConfig::default();
        assert!(config.console_prints);
        assert!(!config.log_to_file);
        assert_eq!(config.level_console, "info");
    }
}
