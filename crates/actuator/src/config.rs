//! Actuator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{ActuatorError, Output};

/// BCM pin numbers of every actuator line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub forward: u8,
    pub backward: u8,
    pub left: u8,
    pub right: u8,
    pub horn: u8,
    /// Driven to its unsafe level while heartbeats are overdue
    pub failsafe: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            forward: 4,
            backward: 27,
            left: 23,
            right: 24,
            horn: 25,
            failsafe: 22,
        }
    }
}

impl PinConfig {
    pub fn pin(&self, output: Output) -> u8 {
        match output {
            Output::Forward => self.forward,
            Output::Backward => self.backward,
            Output::Left => self.left,
            Output::Right => self.right,
            Output::Horn => self.horn,
        }
    }

    /// Every line, failsafe last
    pub fn all(&self) -> [u8; 6] {
        [self.forward, self.backward, self.left, self.right, self.horn, self.failsafe]
    }
}

/// Actuator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    pub pins: PinConfig,

    /// Maximum silence between heartbeats before the failsafe trips (milliseconds)
    pub heartbeat_timeout_ms: u64,

    /// Watchdog tick period (milliseconds)
    pub watchdog_period_ms: u64,

    /// Pin synchronisation period (milliseconds)
    pub sync_period_ms: u64,

    /// A motion command this recent still counts as moving (milliseconds)
    pub motion_window_ms: u64,

    /// Level the failsafe line takes while tripped
    pub failsafe_active_high: bool,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            pins: PinConfig::default(),
            heartbeat_timeout_ms: 300,
            watchdog_period_ms: 10,
            sync_period_ms: 10,
            motion_window_ms: 1_000,
            failsafe_active_high: true,
        }
    }
}

impl ActuatorConfig {
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }

    pub fn watchdog_period(&self) -> Duration {
        Duration::from_millis(self.watchdog_period_ms)
    }

    pub fn sync_period(&self) -> Duration {
        Duration::from_millis(self.sync_period_ms)
    }

    pub fn motion_window(&self) -> Duration {
        Duration::from_millis(self.motion_window_ms)
    }

    pub fn validate(&self) -> Result<(), ActuatorError> {
        if self.heartbeat_timeout_ms == 0 {
            return Err(ActuatorError::InvalidConfig("heartbeat_timeout_ms must be > 0".into()));
        }
        if self.watchdog_period_ms == 0 || self.sync_period_ms == 0 {
            return Err(ActuatorError::InvalidConfig("loop periods must be > 0".into()));
        }
        if self.watchdog_period_ms >= self.heartbeat_timeout_ms {
            return Err(ActuatorError::InvalidConfig(
                "watchdog_period_ms must be shorter than heartbeat_timeout_ms".into(),
            ));
        }

        let mut pins = self.pins.all().to_vec();
        pins.sort_unstable();
        pins.dedup();
        if pins.len() != self.pins.all().len() {
            return Err(ActuatorError::InvalidConfig("pin numbers must be distinct".into()));
        }
        Ok(())
    }
}
