//! Debouncer and keyed debounce engine

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::{BoolHistory, DebounceError, DebounceResult};

/// Debouncer for a single signal
#[derive(Debug, Clone)]
pub struct Debouncer {
    history: BoolHistory,
}

impl Debouncer {
    /// Create a debouncer requiring `window` identical observations
    pub fn new(window: usize) -> Result<Self, DebounceError> {
        Ok(Self {
            history: BoolHistory::new(window)?,
        })
    }

    /// Feed one observation and classify the resulting window
    pub fn observe(&mut self, value: bool) -> DebounceResult {
        self.history.push(value);
        self.classify()
    }

    /// Classify the current window without observing
    pub fn classify(&self) -> DebounceResult {
        if self.history.all_true() {
            DebounceResult::Confirmed
        } else if self.history.all_false() {
            DebounceResult::Cleared
        } else {
            DebounceResult::Pending
        }
    }

    /// Forget every observation
    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn window(&self) -> usize {
        self.history.capacity()
    }

    pub fn history(&self) -> &BoolHistory {
        &self.history
    }
}

/// Set of independent debouncers addressed by signal id.
///
/// Each signal gets its own window size at registration.
#[derive(Debug, Clone)]
pub struct DebounceEngine<K> {
    signals: HashMap<K, Debouncer>,
}

impl<K> DebounceEngine<K>
where
    K: Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self {
            signals: HashMap::new(),
        }
    }

    /// Register a signal with its window size, replacing any previous one
    pub fn register(&mut self, signal: K, window: usize) -> Result<(), DebounceError> {
        self.signals.insert(signal, Debouncer::new(window)?);
        Ok(())
    }

    /// Append `value` to the signal's history and classify it
    pub fn observe(&mut self, signal: &K, value: bool) -> Result<DebounceResult, DebounceError> {
        self.signals
            .get_mut(signal)
            .map(|d| d.observe(value))
            .ok_or_else(|| DebounceError::UnknownSignal(format!("{:?}", signal)))
    }

    /// Empty one signal's history
    pub fn reset(&mut self, signal: &K) -> Result<(), DebounceError> {
        self.signals
            .get_mut(signal)
            .map(Debouncer::reset)
            .ok_or_else(|| DebounceError::UnknownSignal(format!("{:?}", signal)))
    }

    pub fn get(&self, signal: &K) -> Option<&Debouncer> {
        self.signals.get(signal)
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }
}

impl<K> Default for DebounceEngine<K>
where
    K: Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}
