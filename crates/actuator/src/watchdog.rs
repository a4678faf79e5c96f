//! Heartbeat watchdog

use serde::Serialize;
use std::time::{Duration, Instant};

/// Arrival time of the most recent heartbeat
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatClock {
    last: Instant,
}

impl HeartbeatClock {
    pub fn new(now: Instant) -> Self {
        Self { last: now }
    }

    pub fn record(&mut self, now: Instant) {
        self.last = now;
    }

    pub fn last(&self) -> Instant {
        self.last
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last)
    }
}

/// Result of one watchdog tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchdogStatus {
    /// Heartbeats arriving on time
    Healthy,
    /// Timeout exceeded on this tick
    Tripped,
    /// Still overdue since an earlier trip
    Overdue,
    /// Fresh heartbeat after being overdue
    Recovered,
}

impl WatchdogStatus {
    /// Outputs must be forced off
    pub fn is_failsafe(self) -> bool {
        matches!(self, WatchdogStatus::Tripped | WatchdogStatus::Overdue)
    }
}

/// Level-triggered failsafe on heartbeat silence.
///
/// Every tick re-evaluates the heartbeat age; while it exceeds the timeout
/// the status stays failsafe. There is no latch to re-arm.
#[derive(Debug, Clone)]
pub struct HeartbeatWatchdog {
    timeout: Duration,
    clock: HeartbeatClock,
    overdue: bool,
    trips: u64,
}

impl HeartbeatWatchdog {
    /// New watchdog counting the first timeout window from `now`
    pub fn new(timeout: Duration, now: Instant) -> Self {
        Self {
            timeout,
            clock: HeartbeatClock::new(now),
            overdue: false,
            trips: 0,
        }
    }

    /// Record a heartbeat arrival
    pub fn receive_heartbeat(&mut self, now: Instant) {
        self.clock.record(now);
    }

    /// Compare heartbeat age against the timeout
    pub fn tick(&mut self, now: Instant) -> WatchdogStatus {
        let age = self.clock.elapsed(now);

        if age > self.timeout {
            if self.overdue {
                return WatchdogStatus::Overdue;
            }
            self.overdue = true;
            self.trips += 1;
            WatchdogStatus::Tripped
        } else if self.overdue {
            self.overdue = false;
            WatchdogStatus::Recovered
        } else {
            WatchdogStatus::Healthy
        }
    }

    pub fn is_overdue(&self) -> bool {
        self.overdue
    }

    /// Number of times the failsafe has engaged
    pub fn trips(&self) -> u64 {
        self.trips
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn clock(&self) -> &HeartbeatClock {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(300);
    const EPS: Duration = Duration::from_millis(1);

    #[test]
    fn test_within_timeout_healthy() {
        let t0 = Instant::now();
        let mut watchdog = HeartbeatWatchdog::new(TIMEOUT, t0);
        watchdog.receive_heartbeat(t0);

        assert_eq!(watchdog.tick(t0 + TIMEOUT - EPS), WatchdogStatus::Healthy);
        assert_eq!(watchdog.tick(t0 + TIMEOUT), WatchdogStatus::Healthy);
        assert!(!watchdog.is_overdue());
    }

    #[test]
    fn test_trip_is_level_triggered() {
        let t0 = Instant::now();
        let mut watchdog = HeartbeatWatchdog::new(TIMEOUT, t0);

        assert_eq!(watchdog.tick(t0 + TIMEOUT + EPS), WatchdogStatus::Tripped);
        for i in 2..10 {
            let status = watchdog.tick(t0 + TIMEOUT + EPS * i);
            assert_eq!(status, WatchdogStatus::Overdue);
            assert!(status.is_failsafe());
        }
        assert_eq!(watchdog.trips(), 1);
    }

    #[test]
    fn test_heartbeat_recovers() {
        let t0 = Instant::now();
        let mut watchdog = HeartbeatWatchdog::new(TIMEOUT, t0);
        let late = t0 + Duration::from_secs(1);
        assert!(watchdog.tick(late).is_failsafe());

        watchdog.receive_heartbeat(late);
        assert_eq!(watchdog.tick(late + EPS), WatchdogStatus::Recovered);
        assert_eq!(watchdog.tick(late + EPS * 2), WatchdogStatus::Healthy);

        // A second silence trips again
        assert_eq!(watchdog.tick(late + TIMEOUT * 2), WatchdogStatus::Tripped);
        assert_eq!(watchdog.trips(), 2);
    }
}
