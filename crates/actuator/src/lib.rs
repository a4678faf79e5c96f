//! Actuation Node Core
//!
//! Everything between an incoming command and a GPIO write:
//! - Motor state and the command dispatcher with sequence deduplication
//! - Heartbeat watchdog forcing outputs off when the control link goes quiet
//! - Pin synchronisation writing only changed lines
//! - Runtime loops tying them together under one lock

pub mod config;
pub mod dispatcher;
pub mod motor;
pub mod runtime;
pub mod sequence;
pub mod state;
pub mod sync;
pub mod watchdog;

pub use config::{ActuatorConfig, PinConfig};
pub use dispatcher::{CommandDispatcher, CommandOutcome, LastCommand};
pub use motor::{Direction, MotorState, Output};
pub use runtime::{ActuatorRuntime, SharedActuator};
pub use sequence::SequenceGuard;
pub use state::{ActuatorState, OutputSnapshot};
pub use sync::PinSync;
pub use watchdog::{HeartbeatClock, HeartbeatWatchdog, WatchdogStatus};

use thiserror::Error;

/// Actuator error types
#[derive(Error, Debug)]
pub enum ActuatorError {
    #[error("Invalid actuator config: {0}")]
    InvalidConfig(String),

    #[error("Unknown output: {0}")]
    UnknownOutput(String),

    #[error("Actuator task failed: {0}")]
    Task(String),
}
