//! Fixed-capacity boolean ring buffer

use crate::DebounceError;

/// Ring buffer of the most recent boolean observations for one signal.
///
/// Capacity is fixed at construction. Once full, every push overwrites the
/// oldest entry.
#[derive(Debug, Clone)]
pub struct BoolHistory {
    /// Pre-allocated storage
    storage: Box<[bool]>,
    /// Next write position
    head: usize,
    /// Number of valid entries
    len: usize,
    /// Running count of `true` entries, kept in sync with `storage`
    ones: usize,
}

impl BoolHistory {
    /// Create a new history with given capacity
    pub fn new(capacity: usize) -> Result<Self, DebounceError> {
        if capacity == 0 {
            return Err(DebounceError::ZeroCapacity);
        }
        Ok(Self {
            storage: vec![false; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
            ones: 0,
        })
    }

    /// Append an observation, evicting the oldest when full
    pub fn push(&mut self, value: bool) {
        let capacity = self.capacity();
        if self.len == capacity {
            if self.storage[self.head] {
                self.ones -= 1;
            }
        } else {
            self.len += 1;
        }

        self.storage[self.head] = value;
        if value {
            self.ones += 1;
        }
        self.head = (self.head + 1) % capacity;
    }

    /// Number of observations currently held
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if the window is at full capacity
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Full and every entry is `true`
    pub fn all_true(&self) -> bool {
        self.is_full() && self.ones == self.len
    }

    /// Full and every entry is `false`
    pub fn all_false(&self) -> bool {
        self.is_full() && self.ones == 0
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        let capacity = self.capacity();
        let start = (self.head + capacity - self.len) % capacity;
        (0..self.len).map(move |i| self.storage[(start + i) % capacity])
    }

    /// Drop every observation, keeping the capacity
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.ones = 0;
    }
}
