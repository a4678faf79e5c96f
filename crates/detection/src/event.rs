//! Detection events and the output lines they drive

use serde::{Deserialize, Serialize};

/// Physical output line driven by the perception node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputChannel {
    /// Asserted for the duration of a stop hold
    StopAssert,
    /// Mirrors the debounced red-light state
    RedIndicator,
}

/// Discrete event emitted by the detection state machines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionEvent {
    /// Stop sign confirmed, hold started
    StopConfirmed,
    /// Hold elapsed, cooldown started
    HoldExpired,
    /// Red light confirmed on
    RedOn,
    /// Red light confirmed off
    RedOff,
}

impl DetectionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StopConfirmed => "stop_confirmed",
            Self::HoldExpired => "hold_expired",
            Self::RedOn => "red_on",
            Self::RedOff => "red_off",
        }
    }

    /// Output line and level this event sets
    pub fn output(&self) -> (OutputChannel, bool) {
        match self {
            Self::StopConfirmed => (OutputChannel::StopAssert, true),
            Self::HoldExpired => (OutputChannel::StopAssert, false),
            Self::RedOn => (OutputChannel::RedIndicator, true),
            Self::RedOff => (OutputChannel::RedIndicator, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_outputs() {
        assert_eq!(DetectionEvent::StopConfirmed.output(), (OutputChannel::StopAssert, true));
        assert_eq!(DetectionEvent::HoldExpired.output(), (OutputChannel::StopAssert, false));
        assert_eq!(DetectionEvent::RedOn.output(), (OutputChannel::RedIndicator, true));
        assert_eq!(DetectionEvent::RedOff.output(), (OutputChannel::RedIndicator, false));
    }
}
