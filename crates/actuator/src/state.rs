//! Shared actuator state

use std::time::{Duration, Instant};

use crate::{
    ActuatorConfig, CommandDispatcher, CommandOutcome, HeartbeatWatchdog, LastCommand, MotorState, Output,
    WatchdogStatus,
};

/// Desired level of every actuator line at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputSnapshot {
    pub motors: MotorState,
    pub horn: bool,
    pub failsafe: bool,
}

/// Motor state, sequence guard and heartbeat clock behind one lock.
///
/// Command handlers, the watchdog loop and the pin-sync loop all go through
/// this struct, so no reader ever sees a half-applied update.
#[derive(Debug)]
pub struct ActuatorState {
    dispatcher: CommandDispatcher,
    watchdog: HeartbeatWatchdog,
    motion_window: Duration,
}

impl ActuatorState {
    pub fn new(config: &ActuatorConfig, now: Instant) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(),
            watchdog: HeartbeatWatchdog::new(config.heartbeat_timeout(), now),
            motion_window: config.motion_window(),
        }
    }

    pub fn dispatch(&mut self, output: Output, active: bool, sequence: u64, now: Instant) -> CommandOutcome {
        self.dispatcher.dispatch(output, active, sequence, now)
    }

    /// Safety override: clears everything, ignores the sequence guard
    pub fn stop_all(&mut self) {
        self.dispatcher.stop_all();
    }

    pub fn receive_heartbeat(&mut self, now: Instant) {
        self.watchdog.receive_heartbeat(now);
        metrics::counter!("actuator_heartbeats_total").increment(1);
    }

    /// Run one watchdog evaluation, zeroing outputs while overdue
    pub fn watchdog_tick(&mut self, now: Instant) -> WatchdogStatus {
        let status = self.watchdog.tick(now);
        if status.is_failsafe() {
            self.dispatcher.force_stop();
        }
        match status {
            WatchdogStatus::Tripped => {
                metrics::counter!("actuator_watchdog_trips_total").increment(1);
                metrics::gauge!("actuator_failsafe_active").set(1.0);
            }
            WatchdogStatus::Recovered => metrics::gauge!("actuator_failsafe_active").set(0.0),
            _ => {}
        }
        status
    }

    pub fn is_moving(&self, now: Instant) -> bool {
        self.dispatcher.is_moving(now, self.motion_window)
    }

    pub fn failsafe_active(&self) -> bool {
        self.watchdog.is_overdue()
    }

    /// Desired outputs; motion and horn are masked while the failsafe holds
    pub fn snapshot(&self) -> OutputSnapshot {
        if self.failsafe_active() {
            return OutputSnapshot {
                motors: MotorState::default(),
                horn: false,
                failsafe: true,
            };
        }
        OutputSnapshot {
            motors: self.dispatcher.motors(),
            horn: self.dispatcher.horn(),
            failsafe: false,
        }
    }

    pub fn motors(&self) -> MotorState {
        self.dispatcher.motors()
    }

    pub fn last_command(&self) -> Option<LastCommand> {
        self.dispatcher.last_command()
    }

    pub fn heartbeat_age(&self, now: Instant) -> Duration {
        self.watchdog.clock().elapsed(now)
    }

    pub fn watchdog_trips(&self) -> u64 {
        self.watchdog.trips()
    }
}
