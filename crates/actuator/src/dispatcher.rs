//! Command dispatcher

use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::{MotorState, Output, SequenceGuard};

/// Outcome of a dispatched command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOutcome {
    Accepted,
    /// Sequence not newer than the last accepted one; nothing changed
    Stale,
}

impl CommandOutcome {
    pub fn accepted(self) -> bool {
        self == CommandOutcome::Accepted
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CommandOutcome::Accepted => "accepted",
            CommandOutcome::Stale => "stale",
        }
    }
}

/// Most recent state-changing command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastCommand {
    Set { output: Output, active: bool },
    StopAll,
}

impl fmt::Display for LastCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastCommand::Set { output, active } => {
                write!(f, "{} {}", output.as_str(), if *active { "ON" } else { "OFF" })
            }
            LastCommand::StopAll => f.write_str("stop"),
        }
    }
}

/// Applies commands to the motor state behind a sequence guard
#[derive(Debug, Clone, Default)]
pub struct CommandDispatcher {
    motors: MotorState,
    horn: bool,
    guard: SequenceGuard,
    last_motion: Option<Instant>,
    last_command: Option<LastCommand>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `output = active` if `sequence` is newer than any accepted before
    pub fn dispatch(&mut self, output: Output, active: bool, sequence: u64, now: Instant) -> CommandOutcome {
        if !self.guard.accept(sequence) {
            debug!(
                "Stale command ignored: {} {} seq {} (last {:?})",
                output.as_str(),
                active,
                sequence,
                self.guard.last_accepted()
            );
            metrics::counter!("actuator_commands_total", "outcome" => "stale").increment(1);
            return CommandOutcome::Stale;
        }

        self.apply(output, active, now);
        CommandOutcome::Accepted
    }

    fn apply(&mut self, output: Output, active: bool, now: Instant) {
        match output.direction() {
            Some(direction) => {
                self.motors.set(direction, active);
                self.last_motion = Some(now);
            }
            None => self.horn = active,
        }
        self.last_command = Some(LastCommand::Set { output, active });
        metrics::counter!("actuator_commands_total", "outcome" => "accepted").increment(1);
        debug!("{} {}", output.as_str(), if active { "ON" } else { "OFF" });
    }

    /// Clear every output regardless of sequence
    pub fn stop_all(&mut self) {
        self.force_stop();
        self.last_command = Some(LastCommand::StopAll);
        info!("All outputs stopped");
    }

    /// Clear every output without recording a command
    pub fn force_stop(&mut self) {
        self.motors.clear();
        self.horn = false;
        self.last_motion = None;
    }

    /// Any direction active, or a motion command within `window`
    pub fn is_moving(&self, now: Instant, window: Duration) -> bool {
        self.motors.any_active()
            || self
                .last_motion
                .map_or(false, |at| now.saturating_duration_since(at) < window)
    }

    pub fn motors(&self) -> MotorState {
        self.motors
    }

    pub fn horn(&self) -> bool {
        self.horn
    }

    pub fn last_command(&self) -> Option<LastCommand> {
        self.last_command
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.guard.last_accepted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Direction;

    const WINDOW: Duration = Duration::from_millis(1000);

    #[test]
    fn test_stale_command_rejected() {
        let now = Instant::now();
        let mut dispatcher = CommandDispatcher::new();

        assert_eq!(dispatcher.dispatch(Output::Forward, true, 5, now), CommandOutcome::Accepted);
        assert_eq!(dispatcher.dispatch(Output::Forward, false, 3, now), CommandOutcome::Stale);
        assert!(dispatcher.motors().get(Direction::Forward));
        assert_eq!(dispatcher.last_sequence(), Some(5));
    }

    #[test]
    fn test_duplicate_sequence_rejected() {
        let now = Instant::now();
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.dispatch(Output::Left, true, 1, now);
        assert!(!dispatcher.dispatch(Output::Right, true, 1, now).accepted());
        assert!(!dispatcher.motors().right);
    }

    #[test]
    fn test_horn_is_not_motion() {
        let now = Instant::now();
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.dispatch(Output::Horn, true, 1, now);

        assert!(dispatcher.horn());
        assert!(!dispatcher.is_moving(now, WINDOW));
        assert_eq!(dispatcher.last_command().unwrap().to_string(), "horn ON");
    }

    #[test]
    fn test_motion_window() {
        let t0 = Instant::now();
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.dispatch(Output::Forward, true, 1, t0);
        assert!(dispatcher.is_moving(t0, WINDOW));

        dispatcher.dispatch(Output::Forward, false, 2, t0 + Duration::from_millis(100));
        assert!(dispatcher.is_moving(t0 + Duration::from_millis(500), WINDOW));
        assert!(!dispatcher.is_moving(t0 + Duration::from_millis(1200), WINDOW));
    }

    #[test]
    fn test_stop_all_bypasses_guard() {
        let now = Instant::now();
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.dispatch(Output::Forward, true, 10, now);
        dispatcher.dispatch(Output::Horn, true, 11, now);

        dispatcher.stop_all();
        assert_eq!(dispatcher.motors(), MotorState::default());
        assert!(!dispatcher.horn());
        assert!(!dispatcher.is_moving(now, WINDOW));
        assert_eq!(dispatcher.last_command(), Some(LastCommand::StopAll));

        // Guard untouched by stop-all
        assert!(!dispatcher.dispatch(Output::Forward, true, 11, now).accepted());
        assert!(dispatcher.dispatch(Output::Forward, true, 12, now).accepted());
    }
}
