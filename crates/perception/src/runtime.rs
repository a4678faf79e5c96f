//! Frame loop

use std::time::Duration;

use detection::DetectionEvent;
use tokio::sync::watch;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use vision::{LatestFrame, SceneClassifier};

use crate::{MotionCache, PerceptionError, PerceptionPipeline};

/// Why the frame loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Frame source ran out
    EndOfStream,
    /// Shutdown requested
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: u64,
    pub events: u64,
    pub exit: LoopExit,
}

/// Pulls the newest frame, classifies it and feeds the pipeline
pub struct FrameLoop {
    frames: LatestFrame,
    classifier: Box<dyn SceneClassifier>,
    pipeline: PerceptionPipeline,
    motion: MotionCache,
    period: Duration,
    last_sequence: Option<u64>,
    events: u64,
}

impl FrameLoop {
    pub fn new(
        frames: LatestFrame,
        classifier: Box<dyn SceneClassifier>,
        pipeline: PerceptionPipeline,
        motion: MotionCache,
        period: Duration,
    ) -> Self {
        Self {
            frames,
            classifier,
            pipeline,
            motion,
            period,
            last_sequence: None,
            events: 0,
        }
    }

    /// Process the newest frame unless it was already seen.
    ///
    /// Returns `None` when there was no new frame. A classifier failure skips
    /// the frame.
    pub fn step(&mut self, now: std::time::Instant) -> Result<Option<Vec<DetectionEvent>>, PerceptionError> {
        let Some(frame) = self.frames.latest() else {
            return Ok(None);
        };
        if self.last_sequence == Some(frame.sequence) {
            return Ok(None);
        }
        self.last_sequence = Some(frame.sequence);

        let detection = match self.classifier.classify(&frame) {
            Ok(detection) => detection,
            Err(e) => {
                warn!("Skipping frame {}: {}", frame.sequence, e);
                return Ok(Some(Vec::new()));
            }
        };

        let events = self.pipeline.process(&detection, self.motion.is_moving(), now)?;
        self.events += events.len() as u64;
        Ok(Some(events))
    }

    /// Run until the stream ends or shutdown flips to `true`. Outputs are
    /// driven low on every exit path.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<LoopSummary, PerceptionError> {
        info!("Frame loop started (period {:?})", self.period);
        let result = self.run_until_exit(&mut shutdown).await;
        self.pipeline.release();

        let exit = result?;
        let summary = LoopSummary {
            frames: self.pipeline.frames(),
            events: self.events,
            exit,
        };
        info!(
            "Frame loop stopped ({:?}): {} frames, {} events",
            summary.exit, summary.frames, summary.events
        );
        Ok(summary)
    }

    async fn run_until_exit(&mut self, shutdown: &mut watch::Receiver<bool>) -> Result<LoopExit, PerceptionError> {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Read before stepping so a final frame published just
                    // before finish is still processed
                    let finished = self.frames.is_finished();
                    let stepped = self.step(Instant::now().into_std())?;
                    if finished && stepped.is_none() {
                        debug!("No frames left");
                        return Ok(LoopExit::EndOfStream);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return Ok(LoopExit::Shutdown);
                    }
                }
            }
        }
    }
}
