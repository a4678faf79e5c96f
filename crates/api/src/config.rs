//! Actuation node settings

use std::path::Path;

use ::config::{Config, Environment, File};
use actuator::ActuatorConfig;
use gpio::DEFAULT_SYSFS_ROOT;
use node_common::LoggingConfig;
use serde::{Deserialize, Serialize};

use crate::ApiError;

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
    /// Allow cross-origin requests (browser dashboards)
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
            cors: false,
        }
    }
}

/// Actuation node settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorSettings {
    pub actuator: ActuatorConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// sysfs GPIO root
    pub gpio_root: String,
}

impl Default for ActuatorSettings {
    fn default() -> Self {
        Self {
            actuator: ActuatorConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            gpio_root: DEFAULT_SYSFS_ROOT.to_string(),
        }
    }
}

impl ActuatorSettings {
    /// Defaults, then the optional file, then `ROBOT_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, ApiError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix("ROBOT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        self.actuator.validate()?;
        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(ApiError::InvalidConfig(format!("bad bind address {}", self.server.bind)));
        }
        Ok(())
    }
}
