//! Stop-sign hold/cooldown controller

use debounce::DebounceResult;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::{DetectionConfig, DetectionEvent};

/// Controller phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopPhase {
    /// Armed, waiting for a confirmed stop sign
    #[default]
    Idle,
    /// Stop output asserted until the hold deadline
    Holding,
    /// Hold over; latch stays set until cooldown elapses and the vehicle moves
    Cooldown,
}

/// Snapshot of the controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopEventState {
    pub phase: StopPhase,
    /// One-shot guard, set on confirmation and cleared only by the reset path
    pub latched: bool,
    pub hold_until: Option<Instant>,
    pub cooldown_until: Option<Instant>,
}

/// One-shot stop latch layered over the debounced stop signal.
///
/// Transitions:
/// - `Idle -> Holding` on `Confirmed`, unlatched, and past any cooldown deadline
/// - `Holding -> Cooldown` once `hold_until` is reached
/// - `Cooldown -> Idle` only when moving AND past `cooldown_until`
///
/// At most one transition fires per [`update`](Self::update).
#[derive(Debug, Clone)]
pub struct StopEventController {
    hold: Duration,
    cooldown: Duration,
    state: StopEventState,
}

impl StopEventController {
    pub fn new(hold: Duration, cooldown: Duration) -> Self {
        Self {
            hold,
            cooldown,
            state: StopEventState {
                phase: StopPhase::Idle,
                latched: false,
                hold_until: None,
                cooldown_until: None,
            },
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(config.hold(), config.cooldown())
    }

    /// Advance the state machine for one detection cycle.
    ///
    /// `moving` is the last known answer of the motion-status query; callers
    /// pass `false` when the query failed.
    pub fn update(&mut self, stop: DebounceResult, moving: bool, now: Instant) -> Option<DetectionEvent> {
        match self.state.phase {
            StopPhase::Idle => {
                if !stop.is_confirmed() || self.state.latched || !self.cooldown_elapsed(now) {
                    return None;
                }
                self.state.phase = StopPhase::Holding;
                self.state.latched = true;
                self.state.hold_until = Some(now + self.hold);
                info!("Stop sign confirmed, holding for {:?}", self.hold);
                Some(DetectionEvent::StopConfirmed)
            }
            StopPhase::Holding => {
                let expired = self.state.hold_until.map_or(true, |until| now >= until);
                if !expired {
                    return None;
                }
                self.state.phase = StopPhase::Cooldown;
                self.state.hold_until = None;
                self.state.cooldown_until = Some(now + self.cooldown);
                info!("Stop hold ended, cooldown active for {:?}", self.cooldown);
                Some(DetectionEvent::HoldExpired)
            }
            StopPhase::Cooldown => {
                if moving && self.cooldown_elapsed(now) {
                    self.state.phase = StopPhase::Idle;
                    self.state.latched = false;
                    debug!("Vehicle moving after cooldown, stop latch re-armed");
                }
                None
            }
        }
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        self.state.cooldown_until.map_or(true, |until| now >= until)
    }

    pub fn state(&self) -> StopEventState {
        self.state
    }

    pub fn phase(&self) -> StopPhase {
        self.state.phase
    }

    pub fn is_latched(&self) -> bool {
        self.state.latched
    }

    /// Stop output level implied by the current phase
    pub fn output_asserted(&self) -> bool {
        self.state.phase == StopPhase::Holding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(t0: Instant, secs: f64) -> Instant {
        t0 + Duration::from_secs_f64(secs)
    }

    fn controller() -> StopEventController {
        StopEventController::new(Duration::from_secs(3), Duration::from_secs(8))
    }

    #[test]
    fn test_reference_scenario() {
        let t0 = Instant::now();
        let mut debouncer = debounce::Debouncer::new(3).unwrap();
        let mut stop = controller();

        let mut events = Vec::new();
        for _ in 0..3 {
            let result = debouncer.observe(true);
            events.extend(stop.update(result, false, t0));
        }
        assert_eq!(events, vec![DetectionEvent::StopConfirmed]);
        assert!(stop.output_asserted());
        assert_eq!(stop.state().hold_until, Some(at(t0, 3.0)));

        assert_eq!(
            stop.update(DebounceResult::Pending, false, at(t0, 3.0)),
            Some(DetectionEvent::HoldExpired)
        );
        assert!(!stop.output_asserted());
        assert_eq!(stop.state().cooldown_until, Some(at(t0, 11.0)));

        // Moving, but cooldown not elapsed
        assert_eq!(stop.update(DebounceResult::Pending, true, at(t0, 9.0)), None);
        assert!(stop.is_latched());
        assert_eq!(stop.phase(), StopPhase::Cooldown);

        assert_eq!(stop.update(DebounceResult::Pending, true, at(t0, 12.0)), None);
        assert!(!stop.is_latched());
        assert_eq!(stop.phase(), StopPhase::Idle);
    }

    #[test]
    fn test_confirmed_during_hold_is_noop() {
        let t0 = Instant::now();
        let mut stop = controller();
        assert!(stop.update(DebounceResult::Confirmed, false, t0).is_some());

        for i in 1..30 {
            let now = at(t0, i as f64 * 0.1);
            assert_eq!(stop.update(DebounceResult::Confirmed, true, now), None);
        }
        assert_eq!(stop.phase(), StopPhase::Holding);
    }

    #[test]
    fn test_stationary_vehicle_never_rearms() {
        let t0 = Instant::now();
        let mut stop = controller();
        stop.update(DebounceResult::Confirmed, false, t0);
        stop.update(DebounceResult::Confirmed, false, at(t0, 3.0));

        // Sign still in view, vehicle never moves
        for i in 0..100 {
            let now = at(t0, 3.0 + i as f64);
            assert_eq!(stop.update(DebounceResult::Confirmed, false, now), None);
        }
        assert!(stop.is_latched());
    }

    #[test]
    fn test_rearmed_controller_retriggers() {
        let t0 = Instant::now();
        let mut stop = controller();
        stop.update(DebounceResult::Confirmed, false, t0);
        stop.update(DebounceResult::Pending, false, at(t0, 3.0));
        stop.update(DebounceResult::Pending, true, at(t0, 11.0));
        assert_eq!(stop.phase(), StopPhase::Idle);

        assert_eq!(
            stop.update(DebounceResult::Confirmed, false, at(t0, 20.0)),
            Some(DetectionEvent::StopConfirmed)
        );
    }

    #[derive(Debug, Clone)]
    struct Step {
        dt_ms: u64,
        stop: DebounceResult,
        moving: bool,
    }

    fn step() -> impl Strategy<Value = Step> {
        (
            0u64..2_000,
            prop_oneof![
                Just(DebounceResult::Confirmed),
                Just(DebounceResult::Cleared),
                Just(DebounceResult::Pending)
            ],
            any::<bool>(),
        )
            .prop_map(|(dt_ms, stop, moving)| Step { dt_ms, stop, moving })
    }

    proptest! {
        #[test]
        fn prop_latch_invariants(steps in proptest::collection::vec(step(), 1..200)) {
            let t0 = Instant::now();
            let mut now = t0;
            let mut stop = controller();

            for s in steps {
                now += Duration::from_millis(s.dt_ms);
                let before = stop.state();
                let event = stop.update(s.stop, s.moving, now);
                let after = stop.state();

                // StopConfirmed only from Idle
                if event == Some(DetectionEvent::StopConfirmed) {
                    prop_assert_eq!(before.phase, StopPhase::Idle);
                    prop_assert!(!before.latched);
                }

                // No return to Idle before the cooldown deadline
                if before.phase == StopPhase::Cooldown && after.phase == StopPhase::Idle {
                    prop_assert!(s.moving);
                    prop_assert!(now >= before.cooldown_until.unwrap());
                }

                prop_assert_eq!(after.latched, after.phase != StopPhase::Idle);
            }
        }
    }
}
