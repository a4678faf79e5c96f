//! Perception node settings

use std::path::Path;
use std::time::Duration;

use ::config::{Config, Environment, File};
use detection::{DetectionConfig, OutputChannel};
use node_common::LoggingConfig;
use serde::{Deserialize, Serialize};
use vision::{CaptureConfig, RedBlobConfig};

use crate::PerceptionError;

/// Output line numbers for the two perception channels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputPins {
    /// Stop-assert line
    pub stop: u8,
    /// Red-indicator line
    pub red: u8,
}

impl Default for OutputPins {
    fn default() -> Self {
        Self { stop: 16, red: 12 }
    }
}

impl OutputPins {
    pub fn pin(&self, channel: OutputChannel) -> u8 {
        match channel {
            OutputChannel::StopAssert => self.stop,
            OutputChannel::RedIndicator => self.red,
        }
    }
}

/// Motion-status endpoint of the actuation node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Base URL; `/is_moving` is appended
    pub url: String,
    /// Per-request timeout (milliseconds)
    pub timeout_ms: u64,
    /// Delay between queries (milliseconds)
    pub poll_interval_ms: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 100,
            poll_interval_ms: 100,
        }
    }
}

impl StatusConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Perception node settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionSettings {
    pub detection: DetectionConfig,
    pub capture: CaptureConfig,
    pub outputs: OutputPins,
    pub status: StatusConfig,
    pub red_blob: RedBlobConfig,
    pub logging: LoggingConfig,
    /// How often the frame loop checks for a new frame (milliseconds)
    pub loop_period_ms: u64,
}

impl Default for PerceptionSettings {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            capture: CaptureConfig::default(),
            outputs: OutputPins::default(),
            status: StatusConfig::default(),
            red_blob: RedBlobConfig::default(),
            logging: LoggingConfig::default(),
            loop_period_ms: 10,
        }
    }
}

impl PerceptionSettings {
    /// Defaults, then the optional file, then `PERCEPTION_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, PerceptionError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix("PERCEPTION")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    pub fn loop_period(&self) -> Duration {
        Duration::from_millis(self.loop_period_ms)
    }

    pub fn validate(&self) -> Result<(), PerceptionError> {
        self.detection.validate()?;

        if self.capture.fps == 0 {
            return Err(PerceptionError::InvalidConfig("capture fps must be non-zero".into()));
        }
        if self.loop_period_ms == 0 {
            return Err(PerceptionError::InvalidConfig("loop period must be non-zero".into()));
        }
        if self.status.timeout_ms == 0 || self.status.poll_interval_ms == 0 {
            return Err(PerceptionError::InvalidConfig(
                "status timeout and poll interval must be non-zero".into(),
            ));
        }
        if self.outputs.stop == self.outputs.red {
            return Err(PerceptionError::InvalidConfig(format!(
                "stop and red outputs share line {}",
                self.outputs.stop
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = PerceptionSettings::default();
        assert_eq!(settings.outputs.pin(OutputChannel::StopAssert), 16);
        assert_eq!(settings.outputs.pin(OutputChannel::RedIndicator), 12);
        assert_eq!(settings.status.timeout(), Duration::from_millis(100));
        assert_eq!(settings.capture.width, 640);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "loop_period_ms = 20\n[detection]\nstop_window = 5\n[status]\nurl = \"http://robot.local:5000\""
        )
        .unwrap();

        let settings = PerceptionSettings::load(Some(file.path())).unwrap();
        assert_eq!(settings.detection.stop_window, 5);
        assert_eq!(settings.detection.red_on_window, 10);
        assert_eq!(settings.status.url, "http://robot.local:5000");
        assert_eq!(settings.loop_period(), Duration::from_millis(20));
    }

    #[test]
    fn test_validation_rejects_shared_line() {
        let mut settings = PerceptionSettings::default();
        settings.outputs.red = settings.outputs.stop;
        assert!(matches!(settings.validate(), Err(PerceptionError::InvalidConfig(_))));
    }

    #[test]
    fn test_validation_rejects_zero_window() {
        let mut settings = PerceptionSettings::default();
        settings.detection.stop_window = 0;
        assert!(matches!(settings.validate(), Err(PerceptionError::Detection(_))));
    }
}
