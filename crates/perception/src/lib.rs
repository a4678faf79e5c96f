//! Perception Node
//!
//! Turns a stream of camera frames into stop-assert and red-indicator output
//! levels:
//! - Frame loop pulling the newest captured frame and classifying it
//! - Debounce, stop latch and red hysteresis driving the output lines
//! - Background motion-status poller with a fail-closed cached answer

pub mod config;
pub mod motion;
pub mod pipeline;
pub mod runtime;

pub use config::{OutputPins, PerceptionSettings, StatusConfig};
pub use motion::{MotionCache, MotionClient, MotionPoller};
pub use pipeline::PerceptionPipeline;
pub use runtime::{FrameLoop, LoopExit, LoopSummary};

use detection::DetectionError;
use gpio::GpioError;
use thiserror::Error;
use vision::VisionError;

/// Perception error types
#[derive(Error, Debug)]
pub enum PerceptionError {
    #[error("Motion status query failed: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid perception config: {0}")]
    InvalidConfig(String),

    #[error("Detection error: {0}")]
    Detection(#[from] DetectionError),

    #[error("Vision error: {0}")]
    Vision(#[from] VisionError),

    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),
}

impl From<debounce::DebounceError> for PerceptionError {
    fn from(e: debounce::DebounceError) -> Self {
        PerceptionError::Detection(DetectionError::Debounce(e))
    }
}
