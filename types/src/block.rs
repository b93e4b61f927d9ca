//! Block context injected into every engine call.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// Height and time of the block currently being executed.
///
/// This is the only source of time the engine sees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockHeader {
    pub height: u64,
    pub time: Timestamp,
}

impl BlockHeader {
    pub fn new(height: u64, time: Timestamp) -> Self {
        Self { height, time }
    }

    /// The following block, `secs` later.
    pub fn next(&self, secs: u64) -> Self {
        Self {
            height: self.height + 1,
            time: self.time.plus_secs(secs),
        }
    }
}
