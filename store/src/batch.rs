//! Grouped writes that land in a single commit.
//!
//! The engine stages every write of one operation in a [`WriteBatch`] and
//! hands it to [`BatchStore::commit_batch`]. A backend either applies all of
//! it or none of it.

use layer_types::{AccountAddress, HashId};

use crate::block_info::BlockInfo;
use crate::dispute::{Dispute, PayerInfo};
use crate::error::StoreError;
use crate::vote::Vote;
use crate::voter::{StakeholderVoteCounts, Voter};

/// One staged write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreWrite {
    PutDispute(Dispute),
    SetNextDisputeId(u64),
    PutVote(Vote),
    PutVoter {
        dispute_id: u64,
        voter: AccountAddress,
        record: Voter,
    },
    RemoveVoter {
        dispute_id: u64,
        voter: AccountAddress,
    },
    PutVoteCounts {
        dispute_id: u64,
        counts: StakeholderVoteCounts,
    },
    PutDelegatedPowerVoted {
        reporter: AccountAddress,
        dispute_id: u64,
        power: u128,
    },
    PutFeePayer {
        dispute_id: u64,
        info: PayerInfo,
    },
    RemoveFeePayer {
        dispute_id: u64,
        payer: AccountAddress,
    },
    PutBlockInfo {
        hash_id: HashId,
        info: BlockInfo,
    },
    RemoveBlockInfo(HashId),
    PutDust(u128),
    PutTeamAddress(AccountAddress),
}

/// Writes applied in the order they were staged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteBatch {
    writes: Vec<StoreWrite>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: StoreWrite) {
        self.writes.push(write);
    }

    pub fn put_dispute(&mut self, dispute: &Dispute) {
        self.push(StoreWrite::PutDispute(dispute.clone()));
    }

    pub fn set_next_dispute_id(&mut self, id: u64) {
        self.push(StoreWrite::SetNextDisputeId(id));
    }

    pub fn put_vote(&mut self, vote: &Vote) {
        self.push(StoreWrite::PutVote(vote.clone()));
    }

    pub fn put_voter(&mut self, dispute_id: u64, voter: &AccountAddress, record: &Voter) {
        self.push(StoreWrite::PutVoter {
            dispute_id,
            voter: voter.clone(),
            record: record.clone(),
        });
    }

    pub fn remove_voter(&mut self, dispute_id: u64, voter: &AccountAddress) {
        self.push(StoreWrite::RemoveVoter {
            dispute_id,
            voter: voter.clone(),
        });
    }

    pub fn put_vote_counts(&mut self, dispute_id: u64, counts: &StakeholderVoteCounts) {
        self.push(StoreWrite::PutVoteCounts {
            dispute_id,
            counts: *counts,
        });
    }

    pub fn put_delegated_power_voted(
        &mut self,
        reporter: &AccountAddress,
        dispute_id: u64,
        power: u128,
    ) {
        self.push(StoreWrite::PutDelegatedPowerVoted {
            reporter: reporter.clone(),
            dispute_id,
            power,
        });
    }

    pub fn put_fee_payer(&mut self, dispute_id: u64, info: &PayerInfo) {
        self.push(StoreWrite::PutFeePayer {
            dispute_id,
            info: info.clone(),
        });
    }

    pub fn remove_fee_payer(&mut self, dispute_id: u64, payer: &AccountAddress) {
        self.push(StoreWrite::RemoveFeePayer {
            dispute_id,
            payer: payer.clone(),
        });
    }

    pub fn put_block_info(&mut self, hash_id: &HashId, info: &BlockInfo) {
        self.push(StoreWrite::PutBlockInfo {
            hash_id: *hash_id,
            info: *info,
        });
    }

    pub fn remove_block_info(&mut self, hash_id: &HashId) {
        self.push(StoreWrite::RemoveBlockInfo(*hash_id));
    }

    pub fn put_dust(&mut self, dust: u128) {
        self.push(StoreWrite::PutDust(dust));
    }

    pub fn put_team_address(&mut self, team: &AccountAddress) {
        self.push(StoreWrite::PutTeamAddress(team.clone()));
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn writes(&self) -> &[StoreWrite] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<StoreWrite> {
        self.writes
    }
}

/// Atomic application of a [`WriteBatch`].
pub trait BatchStore {
    /// Apply every write or none. An empty batch is a no-op.
    fn commit_batch(&self, batch: WriteBatch) -> Result<(), StoreError>;
}
