//! Command sequence deduplication

use serde::{Deserialize, Serialize};

/// Last accepted command sequence number.
///
/// Starts below every valid sequence, so the first command is always taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceGuard {
    last_accepted: Option<u64>,
}

impl SequenceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `sequence` iff it is newer than the last accepted one
    pub fn accept(&mut self, sequence: u64) -> bool {
        match self.last_accepted {
            Some(last) if sequence <= last => false,
            _ => {
                self.last_accepted = Some(sequence);
                true
            }
        }
    }

    pub fn last_accepted(&self) -> Option<u64> {
        self.last_accepted
    }
}
