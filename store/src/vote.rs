//! Per-round ballot records.

use crate::StoreError;
use layer_types::{AccountAddress, Timestamp, VoteResult};
use serde::{Deserialize, Serialize};

/// Scaled outcome of a tally, in `POWER_REDUCTION` units (1_000_000 = 100%).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub support: u128,
    pub against: u128,
    pub invalid: u128,
}

/// The ballot for one dispute round. `id` equals the dispute id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: u64,
    pub vote_start: Timestamp,
    pub vote_end: Timestamp,
    pub result: VoteResult,
    /// Guards settlement; set once and never cleared.
    pub executed: bool,
    pub voters: Vec<AccountAddress>,
    pub tally: Option<Tally>,
}

impl Vote {
    pub fn new(id: u64, vote_start: Timestamp, vote_end: Timestamp) -> Self {
        Self {
            id,
            vote_start,
            vote_end,
            result: VoteResult::NoTally,
            executed: false,
            voters: Vec::new(),
            tally: None,
        }
    }
}

pub trait VoteStore {
    fn get_vote(&self, id: u64) -> Result<Vote, StoreError>;

    fn put_vote(&self, vote: &Vote) -> Result<(), StoreError>;

    fn has_vote(&self, id: u64) -> Result<bool, StoreError>;
}
