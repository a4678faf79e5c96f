//! Event Detection State Machines
//!
//! Converts debounced per-frame signals into discrete events:
//! - Stop sign: one-shot latch with hold and cooldown deadlines
//! - Red light: hysteresis between a sustained-on and a sustained-off window

pub mod config;
pub mod event;
pub mod red_light;
pub mod stop;

pub use config::DetectionConfig;
pub use event::{DetectionEvent, OutputChannel};
pub use red_light::{RedLightDetector, RedLightState};
pub use stop::{StopEventController, StopEventState, StopPhase};

use debounce::DebounceError;
use thiserror::Error;

/// Detection error types
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Invalid detection config: {0}")]
    InvalidConfig(String),

    #[error("Debounce setup failed: {0}")]
    Debounce(#[from] DebounceError),
}
