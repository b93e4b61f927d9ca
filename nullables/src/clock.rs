//! Nullable block clock: deterministic block headers for testing.

use layer_types::{BlockHeader, Timestamp};
use std::cell::Cell;

/// Produces block headers. Height and time only advance when told to.
pub struct NullBlockClock {
    height: Cell<u64>,
    time: Cell<u64>,
}

impl NullBlockClock {
    pub fn new(height: u64, time_secs: u64) -> Self {
        Self {
            height: Cell::new(height),
            time: Cell::new(time_secs),
        }
    }

    pub fn current(&self) -> BlockHeader {
        BlockHeader::new(self.height.get(), Timestamp::new(self.time.get()))
    }

    /// Move to the next block, `secs` later.
    pub fn advance(&self, secs: u64) -> BlockHeader {
        self.height.set(self.height.get() + 1);
        self.time.set(self.time.get() + secs);
        self.current()
    }
}
