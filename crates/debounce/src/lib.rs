//! Debounce Engine
//!
//! Turns noisy per-frame booleans into stable on/off decisions:
//! - [`BoolHistory`] keeps the last N observations of one signal
//! - [`Debouncer`] applies the all-true / all-false rule to one history
//! - [`DebounceEngine`] owns several debouncers keyed by signal id

mod debouncer;
mod history;

pub use debouncer::{DebounceEngine, Debouncer};
pub use history::BoolHistory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Debounce error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DebounceError {
    #[error("Window capacity must be at least 1")]
    ZeroCapacity,

    #[error("Unknown signal: {0}")]
    UnknownSignal(String),
}

/// Outcome of feeding one observation into a debouncer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebounceResult {
    /// Window full and every entry true
    Confirmed,
    /// Window full and every entry false
    Cleared,
    /// Window not full yet, or mixed
    Pending,
}

impl DebounceResult {
    pub fn is_confirmed(self) -> bool {
        self == DebounceResult::Confirmed
    }

    pub fn is_cleared(self) -> bool {
        self == DebounceResult::Cleared
    }
}
