//! Background loops driving the actuator
//!
//! Two periodic tasks share the actuator state:
//! - the watchdog loop evaluates heartbeat age and forces outputs off when overdue
//! - the pin-sync loop copies a snapshot under the lock and writes pins outside it

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{ActuatorConfig, ActuatorError, ActuatorState, PinSync, WatchdogStatus};

/// Actuator state shared between request handlers and background loops
pub type SharedActuator = Arc<Mutex<ActuatorState>>;

/// Handles to the running watchdog and pin-sync loops
#[derive(Debug)]
pub struct ActuatorRuntime {
    watchdog: JoinHandle<()>,
    sync: JoinHandle<PinSync>,
}

impl ActuatorRuntime {
    /// Spawn both loops; they run until `shutdown` flips to `true` or its sender drops
    pub fn spawn(
        state: SharedActuator,
        sync: PinSync,
        config: &ActuatorConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        info!(
            "Starting actuator runtime (heartbeat timeout {:?}, watchdog every {:?}, sync every {:?})",
            config.heartbeat_timeout(),
            config.watchdog_period(),
            config.sync_period()
        );

        let watchdog = tokio::spawn(watchdog_loop(
            state.clone(),
            config.watchdog_period(),
            shutdown.clone(),
        ));
        let sync = tokio::spawn(sync_loop(state, sync, config.sync_period(), shutdown));

        Self { watchdog, sync }
    }

    /// Wait for both loops to exit. All lines are low once this returns.
    pub async fn join(self) -> Result<PinSync, ActuatorError> {
        self.watchdog
            .await
            .map_err(|e| ActuatorError::Task(format!("watchdog loop: {}", e)))?;
        self.sync
            .await
            .map_err(|e| ActuatorError::Task(format!("pin sync loop: {}", e)))
    }
}

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) -> bool {
    match shutdown.changed().await {
        Ok(()) => *shutdown.borrow(),
        Err(_) => true,
    }
}

async fn watchdog_loop(state: SharedActuator, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = ticker(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now().into_std();
                let (status, age) = {
                    let mut state = state.lock().await;
                    (state.watchdog_tick(now), state.heartbeat_age(now))
                };
                match status {
                    WatchdogStatus::Tripped => {
                        warn!("Heartbeat lost ({:?} since last), failsafe engaged", age)
                    }
                    WatchdogStatus::Recovered => info!("Heartbeat restored, failsafe released"),
                    _ => {}
                }
            }
            stop = shutdown_requested(&mut shutdown) => {
                if stop {
                    break;
                }
            }
        }
    }
    debug!("Watchdog loop stopped");
}

async fn sync_loop(
    state: SharedActuator,
    mut sync: PinSync,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> PinSync {
    let mut ticker = ticker(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = state.lock().await.snapshot();
                sync.apply(&snapshot);
            }
            stop = shutdown_requested(&mut shutdown) => {
                if stop {
                    break;
                }
            }
        }
    }
    sync.release();
    info!("Actuator outputs released");
    sync
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Output;
    use gpio::{MemoryPins, OutputSink};
    use tokio::time::sleep;

    /// Log sink shared with a scoped subscriber
    #[derive(Clone, Default)]
    struct Capture(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn start(pins: &MemoryPins) -> (SharedActuator, ActuatorRuntime, watch::Sender<bool>) {
        let config = ActuatorConfig::default();
        let state = Arc::new(Mutex::new(ActuatorState::new(&config, Instant::now().into_std())));
        let sync = PinSync::new(config.pins.clone(), true, OutputSink::present(pins.clone()));
        let (tx, rx) = watch::channel(false);
        let runtime = ActuatorRuntime::spawn(state.clone(), sync, &config, rx);
        (state, runtime, tx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_reach_pins() {
        let pins = MemoryPins::new();
        let (state, runtime, tx) = start(&pins);

        {
            let mut state = state.lock().await;
            let now = Instant::now().into_std();
            state.receive_heartbeat(now);
            state.dispatch(Output::Forward, true, 1, now);
        }
        sleep(Duration::from_millis(50)).await;
        assert!(pins.level(4));
        assert!(!pins.level(22));

        tx.send(true).unwrap();
        runtime.join().await.unwrap();
        assert!(!pins.level(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_link_engages_failsafe() {
        let pins = MemoryPins::new();
        let (state, runtime, tx) = start(&pins);

        {
            let mut state = state.lock().await;
            let now = Instant::now().into_std();
            state.receive_heartbeat(now);
            state.dispatch(Output::Forward, true, 1, now);
        }
        sleep(Duration::from_millis(50)).await;
        assert!(pins.level(4));

        sleep(Duration::from_millis(400)).await;
        assert!(!pins.level(4));
        assert!(pins.level(22));
        assert!(state.lock().await.failsafe_active());

        {
            let mut state = state.lock().await;
            let now = Instant::now().into_std();
            state.receive_heartbeat(now);
            state.dispatch(Output::Forward, true, 2, now);
        }
        sleep(Duration::from_millis(50)).await;
        assert!(pins.level(4));
        assert!(!pins.level(22));
        assert_eq!(state.lock().await.watchdog_trips(), 1);

        drop(tx);
        runtime.join().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_heartbeat_ever_trips() {
        let pins = MemoryPins::new();
        let (state, runtime, tx) = start(&pins);

        sleep(Duration::from_millis(350)).await;
        assert!(state.lock().await.failsafe_active());
        assert!(pins.level(22));

        tx.send(true).unwrap();
        runtime.join().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_trip_and_recovery_logged_once() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let pins = MemoryPins::new();
        let (state, runtime, tx) = start(&pins);
        state.lock().await.receive_heartbeat(Instant::now().into_std());
        sleep(Duration::from_millis(400)).await;
        state.lock().await.receive_heartbeat(Instant::now().into_std());
        sleep(Duration::from_millis(50)).await;

        tx.send(true).unwrap();
        runtime.join().await.unwrap();

        let logs = capture.text();
        assert_eq!(logs.matches("failsafe engaged").count(), 1, "{}", logs);
        assert_eq!(logs.matches("failsafe released").count(), 1, "{}", logs);
    }
}
