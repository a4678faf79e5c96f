//! Motor state to pin synchronisation

use gpio::OutputSink;
use tracing::debug;

use crate::{Direction, OutputSnapshot, Output, PinConfig};

/// Mirrors output snapshots onto GPIO lines, writing only lines whose level
/// changed since the previous sync.
#[derive(Debug)]
pub struct PinSync {
    pins: PinConfig,
    failsafe_active_high: bool,
    /// Last level written per line, in `PinConfig::all` order
    written: [bool; 6],
    sink: OutputSink,
}

impl PinSync {
    /// Lines are assumed low at start, matching how they are acquired
    pub fn new(pins: PinConfig, failsafe_active_high: bool, sink: OutputSink) -> Self {
        Self {
            pins,
            failsafe_active_high,
            written: [false; 6],
            sink,
        }
    }

    fn levels(&self, snapshot: &OutputSnapshot) -> [bool; 6] {
        let mut levels = [false; 6];
        for (slot, direction) in Direction::ALL.iter().enumerate() {
            levels[slot] = snapshot.motors.get(*direction);
        }
        levels[4] = snapshot.horn;
        levels[5] = snapshot.failsafe == self.failsafe_active_high;
        levels
    }

    /// Write every changed line; returns how many were written
    pub fn apply(&mut self, snapshot: &OutputSnapshot) -> usize {
        let pins = self.pins.all();
        let levels = self.levels(snapshot);
        let mut writes = 0;

        for slot in 0..pins.len() {
            if self.written[slot] != levels[slot] {
                self.sink.set_output(pins[slot], levels[slot]);
                self.written[slot] = levels[slot];
                writes += 1;
            }
        }
        if writes > 0 {
            debug!("Pin sync wrote {} line(s)", writes);
        }
        writes
    }

    /// Drive every line low, used on shutdown
    pub fn release(&mut self) {
        for (slot, pin) in self.pins.all().into_iter().enumerate() {
            self.sink.set_output(pin, false);
            self.written[slot] = false;
        }
    }

    /// Level last written to an output's line
    pub fn written(&self, output: Output) -> bool {
        let pin = self.pins.pin(output);
        self.pins
            .all()
            .iter()
            .position(|p| *p == pin)
            .map_or(false, |slot| self.written[slot])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MotorState;
    use gpio::MemoryPins;

    fn sync(pins: &MemoryPins) -> PinSync {
        PinSync::new(PinConfig::default(), true, OutputSink::present(pins.clone()))
    }

    #[test]
    fn test_only_changed_lines_written() {
        let pins = MemoryPins::new();
        let mut sync = sync(&pins);

        let mut snapshot = OutputSnapshot::default();
        assert_eq!(sync.apply(&snapshot), 0);

        snapshot.motors.forward = true;
        assert_eq!(sync.apply(&snapshot), 1);
        assert_eq!(sync.apply(&snapshot), 0);
        assert!(pins.level(4));
        assert!(sync.written(Output::Forward));

        snapshot.motors.left = true;
        snapshot.horn = true;
        assert_eq!(sync.apply(&snapshot), 2);
        assert_eq!(pins.write_count(), 3);
    }

    #[test]
    fn test_failsafe_line() {
        let pins = MemoryPins::new();
        let mut sync = sync(&pins);
        sync.apply(&OutputSnapshot {
            motors: MotorState {
                forward: true,
                ..Default::default()
            },
            horn: false,
            failsafe: false,
        });

        let tripped = OutputSnapshot {
            failsafe: true,
            ..Default::default()
        };
        assert_eq!(sync.apply(&tripped), 2);
        assert!(!pins.level(4));
        assert!(pins.level(22));
    }

    #[test]
    fn test_active_low_failsafe_written_at_start() {
        let pins = MemoryPins::new();
        let mut sync = PinSync::new(PinConfig::default(), false, OutputSink::present(pins.clone()));
        assert_eq!(sync.apply(&OutputSnapshot::default()), 1);
        assert!(pins.level(22));
    }

    #[test]
    fn test_release_drives_low() {
        let pins = MemoryPins::new();
        let mut sync = sync(&pins);
        sync.apply(&OutputSnapshot {
            motors: MotorState {
                right: true,
                ..Default::default()
            },
            horn: true,
            failsafe: false,
        });

        sync.release();
        assert!(!pins.level(24));
        assert!(!pins.level(25));
    }
}
