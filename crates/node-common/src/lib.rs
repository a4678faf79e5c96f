//! Node Process Plumbing
//!
//! Pieces both binaries need before and after their main loop:
//! - Logging configuration and subscriber installation
//! - Shutdown signal handling (SIGINT and SIGTERM)

mod shutdown;

pub use shutdown::ShutdownSignal;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Max level: trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of plain text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Configured level, falling back to INFO when unparseable
    pub fn max_level(&self) -> Level {
        self.level.parse::<Level>().unwrap_or(Level::INFO)
    }
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) {
    let level = config.max_level();

    if config.json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_level() {
        assert_eq!(LoggingConfig::default().max_level(), Level::INFO);

        let config = LoggingConfig {
            level: "debug".to_string(),
            json: true,
        };
        assert_eq!(config.max_level(), Level::DEBUG);

        let config = LoggingConfig {
            level: "chatty".to_string(),
            json: false,
        };
        assert_eq!(config.max_level(), Level::INFO);
    }
}
