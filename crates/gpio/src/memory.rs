//! In-memory pins for simulation and tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{GpioError, PinWriter};

#[derive(Debug, Default)]
struct PinBank {
    levels: HashMap<u8, bool>,
    writes: Vec<(u8, bool)>,
}

/// Pin writer recording every write. Clones share the same bank.
#[derive(Debug, Clone, Default)]
pub struct MemoryPins {
    bank: Arc<Mutex<PinBank>>,
}

impl MemoryPins {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PinBank> {
        self.bank.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current level of a pin; never-written pins read low
    pub fn level(&self, pin: u8) -> bool {
        self.lock().levels.get(&pin).copied().unwrap_or(false)
    }

    /// Every write so far, in order
    pub fn writes(&self) -> Vec<(u8, bool)> {
        self.lock().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.lock().writes.len()
    }
}

impl PinWriter for MemoryPins {
    fn write(&mut self, pin: u8, high: bool) -> Result<(), GpioError> {
        let mut bank = self.lock();
        bank.levels.insert(pin, high);
        bank.writes.push((pin, high));
        Ok(())
    }
}
