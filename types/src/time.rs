//! Block timestamps.
//!
//! Timestamps are Unix epoch seconds taken from the block header. The engine
//! never reads the system clock; replicas must agree on every comparison.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const ONE_DAY_SECS: u64 = 24 * 60 * 60;
pub const TWO_DAYS_SECS: u64 = 2 * ONE_DAY_SECS;
pub const THREE_DAYS_SECS: u64 = 3 * ONE_DAY_SECS;

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    pub fn minus_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_sub(secs))
    }

    /// Strictly earlier than `other`.
    pub fn is_before(&self, other: Timestamp) -> bool {
        self.0 < other.0
    }

    /// Seconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
