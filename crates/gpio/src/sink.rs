//! Capability-gated output sink

use tracing::{debug, warn};

use crate::PinWriter;

/// Output sink that is either wired to real pins or absent.
///
/// Writes are fire-and-forget: failures are logged and never reach the
/// caller, and an absent sink accepts every write as a no-op.
pub enum OutputSink {
    Present(Box<dyn PinWriter>),
    Absent,
}

impl OutputSink {
    pub fn present(writer: impl PinWriter + 'static) -> Self {
        OutputSink::Present(Box::new(writer))
    }

    pub fn is_present(&self) -> bool {
        matches!(self, OutputSink::Present(_))
    }

    /// Drive a pin to a level
    pub fn set_output(&mut self, pin: u8, high: bool) {
        match self {
            OutputSink::Present(writer) => {
                if let Err(e) = writer.write(pin, high) {
                    warn!("Output write failed: {}", e);
                }
            }
            OutputSink::Absent => debug!("No GPIO: pin {} -> {}", pin, high),
        }
    }
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputSink::Present(_) => f.write_str("OutputSink::Present"),
            OutputSink::Absent => f.write_str("OutputSink::Absent"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GpioError, MemoryPins};

    struct FailingPins;

    impl PinWriter for FailingPins {
        fn write(&mut self, pin: u8, _high: bool) -> Result<(), GpioError> {
            Err(GpioError::Write {
                pin,
                reason: "bus error".to_string(),
            })
        }
    }

    #[test]
    fn test_present_sink_writes() {
        let pins = MemoryPins::new();
        let mut sink = OutputSink::present(pins.clone());
        assert!(sink.is_present());

        sink.set_output(16, true);
        assert!(pins.level(16));
        sink.set_output(16, false);
        assert_eq!(pins.writes(), vec![(16, true), (16, false)]);
    }

    #[test]
    fn test_absent_sink_is_noop() {
        let mut sink = OutputSink::Absent;
        assert!(!sink.is_present());
        sink.set_output(12, true);
    }

    #[test]
    fn test_write_failure_swallowed() {
        let mut sink = OutputSink::present(FailingPins);
        sink.set_output(4, true);
    }
}
