//! Per-frame detection pipeline

use std::time::Instant;

use debounce::DebounceEngine;
use detection::{
    DetectionConfig, DetectionEvent, OutputChannel, RedLightDetector, StopEventController, StopPhase,
};
use gpio::OutputSink;
use tracing::debug;
use vision::Detection;

use crate::{OutputPins, PerceptionError};

/// Debounce, stop latch and red hysteresis wired to the output lines.
///
/// Owned by the frame loop; nothing here is shared.
#[derive(Debug)]
pub struct PerceptionPipeline {
    debounce: DebounceEngine<OutputChannel>,
    stop: StopEventController,
    red: RedLightDetector,
    pins: OutputPins,
    sink: OutputSink,
    frames: u64,
}

impl PerceptionPipeline {
    pub fn new(config: &DetectionConfig, pins: OutputPins, sink: OutputSink) -> Result<Self, PerceptionError> {
        config.validate()?;

        let mut debounce = DebounceEngine::new();
        debounce.register(OutputChannel::StopAssert, config.stop_window)?;

        Ok(Self {
            debounce,
            stop: StopEventController::from_config(config),
            red: RedLightDetector::from_config(config)?,
            pins,
            sink,
            frames: 0,
        })
    }

    /// Run one classified frame through the state machines and drive outputs
    /// for whatever events fire.
    pub fn process(
        &mut self,
        detection: &Detection,
        moving: bool,
        now: Instant,
    ) -> Result<Vec<DetectionEvent>, PerceptionError> {
        self.frames += 1;
        metrics::counter!("perception_frames_total").increment(1);

        let stop = self.debounce.observe(&OutputChannel::StopAssert, detection.stop_candidate)?;
        let events: Vec<DetectionEvent> = self
            .stop
            .update(stop, moving, now)
            .into_iter()
            .chain(self.red.observe(detection.red_candidate))
            .collect();

        for event in &events {
            let (channel, level) = event.output();
            metrics::counter!("perception_events_total", "event" => event.as_str()).increment(1);
            debug!("{} -> {:?} {}", event.as_str(), channel, level);
            self.sink.set_output(self.pins.pin(channel), level);
        }

        Ok(events)
    }

    /// Drive both lines low
    pub fn release(&mut self) {
        self.sink.set_output(self.pins.stop, false);
        self.sink.set_output(self.pins.red, false);
    }

    pub fn stop_phase(&self) -> StopPhase {
        self.stop.phase()
    }

    pub fn stop_asserted(&self) -> bool {
        self.stop.output_asserted()
    }

    pub fn red_on(&self) -> bool {
        self.red.is_on()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpio::MemoryPins;
    use std::time::Duration;

    fn pipeline(pins: &MemoryPins) -> PerceptionPipeline {
        PerceptionPipeline::new(
            &DetectionConfig::default(),
            OutputPins::default(),
            OutputSink::present(pins.clone()),
        )
        .unwrap()
    }

    fn stop() -> Detection {
        Detection {
            stop_candidate: true,
            ..Default::default()
        }
    }

    fn red() -> Detection {
        Detection {
            red_candidate: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_stop_sign_drives_line() {
        let pins = MemoryPins::new();
        let mut pipeline = pipeline(&pins);
        let t0 = Instant::now();

        assert!(pipeline.process(&stop(), false, t0).unwrap().is_empty());
        assert!(pipeline.process(&stop(), false, t0).unwrap().is_empty());
        assert_eq!(pipeline.process(&stop(), false, t0).unwrap(), vec![DetectionEvent::StopConfirmed]);
        assert!(pins.level(16));
        assert!(pipeline.stop_asserted());

        // Sign still in view: no second event, line stays up
        assert!(pipeline.process(&stop(), false, t0 + Duration::from_secs(1)).unwrap().is_empty());
        assert!(pins.level(16));

        let events = pipeline
            .process(&Detection::default(), false, t0 + Duration::from_secs(3))
            .unwrap();
        assert_eq!(events, vec![DetectionEvent::HoldExpired]);
        assert!(!pins.level(16));
        assert_eq!(pipeline.stop_phase(), StopPhase::Cooldown);

        // Stationary past the cooldown: the latch holds
        for secs in 4..15 {
            let events = pipeline.process(&stop(), false, t0 + Duration::from_secs(secs)).unwrap();
            assert!(events.is_empty());
        }
        assert_eq!(pins.writes(), vec![(16, true), (16, false)]);
    }

    #[test]
    fn test_rearm_after_moving() {
        let pins = MemoryPins::new();
        let mut pipeline = pipeline(&pins);
        let t0 = Instant::now();
        for _ in 0..3 {
            pipeline.process(&stop(), false, t0).unwrap();
        }
        pipeline.process(&Detection::default(), false, t0 + Duration::from_secs(3)).unwrap();

        let t = t0 + Duration::from_secs(12);
        pipeline.process(&Detection::default(), true, t).unwrap();
        assert_eq!(pipeline.stop_phase(), StopPhase::Idle);

        pipeline.process(&stop(), true, t).unwrap();
        pipeline.process(&stop(), true, t).unwrap();
        assert_eq!(pipeline.process(&stop(), true, t).unwrap(), vec![DetectionEvent::StopConfirmed]);
        assert!(pins.level(16));
    }

    #[test]
    fn test_red_light_hysteresis_drives_indicator() {
        let pins = MemoryPins::new();
        let mut pipeline = pipeline(&pins);
        let now = Instant::now();

        for _ in 0..9 {
            pipeline.process(&red(), false, now).unwrap();
        }
        assert!(!pins.level(12));
        assert_eq!(pipeline.process(&red(), false, now).unwrap(), vec![DetectionEvent::RedOn]);
        assert!(pins.level(12));

        // A single red frame inside the off run restarts it
        for _ in 0..9 {
            pipeline.process(&Detection::default(), false, now).unwrap();
        }
        pipeline.process(&red(), false, now).unwrap();
        for _ in 0..9 {
            pipeline.process(&Detection::default(), false, now).unwrap();
        }
        assert!(pipeline.red_on());
        assert_eq!(
            pipeline.process(&Detection::default(), false, now).unwrap(),
            vec![DetectionEvent::RedOff]
        );
        assert!(!pins.level(12));
        assert_eq!(pipeline.frames(), 30);
    }

    #[test]
    fn test_absent_sink_runs_same_logic() {
        let mut pipeline =
            PerceptionPipeline::new(&DetectionConfig::default(), OutputPins::default(), OutputSink::Absent).unwrap();
        let now = Instant::now();
        for _ in 0..2 {
            pipeline.process(&stop(), false, now).unwrap();
        }
        assert_eq!(pipeline.process(&stop(), false, now).unwrap(), vec![DetectionEvent::StopConfirmed]);
    }

    #[test]
    fn test_release() {
        let pins = MemoryPins::new();
        let mut pipeline = pipeline(&pins);
        let now = Instant::now();
        for _ in 0..3 {
            pipeline.process(&stop(), false, now).unwrap();
        }
        pipeline.release();
        assert!(!pins.level(16));
        assert!(!pins.level(12));
    }
}
