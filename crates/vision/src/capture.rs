//! Capture worker and latest-frame cell

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{FrameSource, VideoFrame, VisionError};

#[derive(Debug, Default)]
struct Slot {
    frame: Option<VideoFrame>,
    published: u64,
    finished: bool,
}

/// Single-producer / single-consumer cell holding only the newest frame.
///
/// Publishing overwrites; readers always see the freshest frame and may skip
/// frames in between.
#[derive(Debug, Clone, Default)]
pub struct LatestFrame {
    slot: Arc<Mutex<Slot>>,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the held frame
    pub fn publish(&self, frame: VideoFrame) {
        let mut slot = self.lock();
        slot.frame = Some(frame);
        slot.published += 1;
    }

    /// Copy of the newest frame, if any has arrived
    pub fn latest(&self) -> Option<VideoFrame> {
        self.lock().frame.clone()
    }

    /// Number of frames published so far
    pub fn published(&self) -> u64 {
        self.lock().published
    }

    /// Mark the stream as ended
    pub fn finish(&self) {
        self.lock().finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.lock().finished
    }
}

/// Background thread pulling frames from a [`FrameSource`].
///
/// Dropping the worker stops the thread and joins it, which drops the source
/// and releases the underlying device.
pub struct CaptureWorker {
    latest: LatestFrame,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureWorker {
    /// Spawn the capture thread
    pub fn spawn(mut source: Box<dyn FrameSource>, fps: u32) -> Result<Self, VisionError> {
        let latest = LatestFrame::new();
        let shutdown = Arc::new(AtomicBool::new(false));

        let cell = latest.clone();
        let stop = shutdown.clone();
        let interval = Duration::from_micros(1_000_000 / fps.max(1) as u64);

        let handle = std::thread::Builder::new()
            .name("frame-capture".to_string())
            .spawn(move || {
                info!("Capture worker started");
                while !stop.load(Ordering::SeqCst) {
                    match source.next_frame() {
                        Ok(Some(frame)) => cell.publish(frame),
                        Ok(None) => {
                            info!("Frame source exhausted");
                            break;
                        }
                        Err(e) => warn!("Frame read error: {}", e),
                    }
                    std::thread::sleep(interval);
                }
                cell.finish();
                debug!("Capture worker exiting, releasing frame source");
            })
            .map_err(|e| VisionError::Worker(e.to_string()))?;

        Ok(Self {
            latest,
            shutdown,
            handle: Some(handle),
        })
    }

    /// Handle to the latest-frame cell
    pub fn frames(&self) -> LatestFrame {
        self.latest.clone()
    }

    /// Stop the thread and wait for it
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Capture worker panicked");
            }
        }
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
