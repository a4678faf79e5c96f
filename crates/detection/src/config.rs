//! Detection configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::DetectionError;

/// Detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Consecutive stop-candidate frames needed to confirm a stop sign
    pub stop_window: usize,

    /// How long the stop output is held after confirmation (milliseconds)
    pub stop_hold_ms: u64,

    /// Cooldown after the hold during which the latch cannot reset (milliseconds)
    pub stop_cooldown_ms: u64,

    /// Consecutive red frames needed to switch the red state on
    pub red_on_window: usize,

    /// Consecutive non-red frames needed to switch the red state off
    pub red_off_window: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            stop_window: 3,
            stop_hold_ms: 3_000,
            stop_cooldown_ms: 8_000,
            red_on_window: 10,
            red_off_window: 10,
        }
    }
}

impl DetectionConfig {
    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.stop_hold_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.stop_cooldown_ms)
    }

    /// Reject window sizes that could never confirm anything
    pub fn validate(&self) -> Result<(), DetectionError> {
        for (name, window) in [
            ("stop_window", self.stop_window),
            ("red_on_window", self.red_on_window),
            ("red_off_window", self.red_off_window),
        ] {
            if window == 0 {
                return Err(DetectionError::InvalidConfig(format!("{} must be at least 1", name)));
            }
        }
        Ok(())
    }
}
