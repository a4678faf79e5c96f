//! GPIO Output Lines
//!
//! Pin writes are the last hop of both processes. Logic above this crate
//! talks to an [`OutputSink`], which is either backed by a real
//! [`PinWriter`] or absent, so the same code runs with or without hardware.

mod memory;
mod sink;
mod sysfs;

pub use memory::MemoryPins;
pub use sink::OutputSink;
pub use sysfs::{SysfsGpio, DEFAULT_SYSFS_ROOT};

use thiserror::Error;

/// GPIO error types
#[derive(Error, Debug)]
pub enum GpioError {
    #[error("GPIO line {pin} unavailable: {reason}")]
    Unavailable { pin: u8, reason: String },

    #[error("GPIO line {0} not acquired")]
    NotAcquired(u8),

    #[error("GPIO write to line {pin} failed: {reason}")]
    Write { pin: u8, reason: String },
}

/// Raw pin-write primitive
pub trait PinWriter: Send {
    fn write(&mut self, pin: u8, high: bool) -> Result<(), GpioError>;
}
