//! Red-light hysteresis detector

use debounce::{DebounceResult, Debouncer};
use tracing::info;

use crate::{DetectionConfig, DetectionError, DetectionEvent};

/// Snapshot of the red-light state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedLightState {
    pub is_on: bool,
    /// Observations in the on-window
    pub on_progress: usize,
    /// Consecutive absent frames in the off-window
    pub off_progress: usize,
}

/// Sticky red-light state driven by two independent windows.
///
/// The on-window needs an unbroken run of red frames to switch on. The
/// off-window counts absent frames and is emptied by any red frame, so only
/// an unbroken run of misses switches it off.
#[derive(Debug, Clone)]
pub struct RedLightDetector {
    is_on: bool,
    on_window: Debouncer,
    off_window: Debouncer,
}

impl RedLightDetector {
    pub fn new(on_window: usize, off_window: usize) -> Result<Self, DetectionError> {
        Ok(Self {
            is_on: false,
            on_window: Debouncer::new(on_window)?,
            off_window: Debouncer::new(off_window)?,
        })
    }

    pub fn from_config(config: &DetectionConfig) -> Result<Self, DetectionError> {
        Self::new(config.red_on_window, config.red_off_window)
    }

    /// Feed one frame's red-candidate flag
    pub fn observe(&mut self, red_candidate: bool) -> Option<DetectionEvent> {
        let on = self.on_window.observe(red_candidate);
        let off = if red_candidate {
            self.off_window.reset();
            DebounceResult::Pending
        } else {
            self.off_window.observe(true)
        };

        if !self.is_on && on.is_confirmed() {
            self.is_on = true;
            info!("Red light ON");
            Some(DetectionEvent::RedOn)
        } else if self.is_on && off.is_confirmed() {
            self.is_on = false;
            info!("Red light OFF");
            Some(DetectionEvent::RedOff)
        } else {
            None
        }
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn state(&self) -> RedLightState {
        RedLightState {
            is_on: self.is_on,
            on_progress: self.on_window.history().len(),
            off_progress: self.off_window.history().len(),
        }
    }
}
