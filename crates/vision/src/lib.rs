//! Vision Collaborators for the Perception Node
//!
//! Provides everything between the camera and the detection core:
//! - Frame sources (live camera, recorded image directories)
//! - A capture worker thread publishing into a latest-frame cell
//! - Scene classifiers producing per-frame stop/red candidates

pub mod camera;
pub mod capture;
pub mod classifier;
pub mod frame;
pub mod source;

pub use camera::CameraSource;
pub use capture::{CaptureWorker, LatestFrame};
pub use classifier::{BoundingBox, Detection, RedBlobClassifier, RedBlobConfig, SceneClassifier, ScriptedClassifier};
pub use frame::VideoFrame;
pub use source::{FrameSource, ImageDirSource};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Vision error types
#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Frame source unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to decode frame {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Frame read failed: {0}")]
    Read(String),

    #[error("Invalid classifier script line {line}: {reason}")]
    Script { line: usize, reason: String },

    #[error("Capture worker failed: {0}")]
    Worker(String),
}

/// Capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Working width frames are scaled to
    pub width: u32,
    /// Working height frames are scaled to
    pub height: u32,
    /// Target capture rate
    pub fps: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}
