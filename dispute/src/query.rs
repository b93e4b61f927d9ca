//! Read-only views over dispute state.

use crate::collaborators::{LedgerAdapter, ReportingSubsystem, StakeRegistry};
use crate::error::DisputeError;
use crate::keeper::Keeper;
use layer_store::{
    BlockInfo, Dispute, DisputeStateStore, PayerInfo, StakeholderVoteCounts, Vote, Voter,
};
use layer_types::{AccountAddress, DisputeParams, DisputeStatus};

impl<S, L, R, O> Keeper<S, L, R, O>
where
    S: DisputeStateStore,
    L: LedgerAdapter,
    R: StakeRegistry,
    O: ReportingSubsystem,
{
    pub fn dispute(&self, dispute_id: u64) -> Result<Dispute, DisputeError> {
        Ok(self.store.get_dispute(dispute_id)?)
    }

    /// Every dispute whose status is `Prevote`, `Voting` or `Unresolved`,
    /// in id order.
    pub fn open_disputes(&self) -> Result<Vec<u64>, DisputeError> {
        Ok(self.store.open_dispute_ids()?)
    }

    /// All disputes, optionally filtered by status.
    pub fn disputes(&self, status: Option<DisputeStatus>) -> Result<Vec<Dispute>, DisputeError> {
        let all = self.store.iter_disputes()?;
        Ok(match status {
            Some(s) => all.into_iter().filter(|d| d.status == s).collect(),
            None => all,
        })
    }

    pub fn vote_info(&self, dispute_id: u64) -> Result<Vote, DisputeError> {
        Ok(self.store.get_vote(dispute_id)?)
    }

    pub fn voter_info(&self, dispute_id: u64, voter: &AccountAddress) -> Result<Voter, DisputeError> {
        Ok(self.store.get_voter(dispute_id, voter)?)
    }

    pub fn vote_counts(&self, dispute_id: u64) -> Result<StakeholderVoteCounts, DisputeError> {
        Ok(self.store.get_vote_counts(dispute_id)?)
    }

    /// Whether the team address has a ballot on `dispute_id`.
    pub fn team_vote(&self, dispute_id: u64) -> Result<bool, DisputeError> {
        match self.team_address()? {
            Some(team) => Ok(self.store.has_voter(dispute_id, &team)?),
            None => Ok(false),
        }
    }

    pub fn fee_payer(&self, dispute_id: u64, payer: &AccountAddress) -> Result<PayerInfo, DisputeError> {
        Ok(self.store.get_fee_payer(dispute_id, payer)?)
    }

    pub fn fee_payers(&self, dispute_id: u64) -> Result<Vec<PayerInfo>, DisputeError> {
        Ok(self.store.fee_payers_for_dispute(dispute_id)?)
    }

    pub fn dispute_block_info(&self, dispute_id: u64) -> Result<BlockInfo, DisputeError> {
        let dispute = self.store.get_dispute(dispute_id)?;
        self.block_info(&dispute.hash_id)
    }

    /// Accumulated sub-unit remainder, in millionths of a loya.
    pub fn dust(&self) -> Result<u128, DisputeError> {
        Ok(self.store.get_dust()?)
    }

    pub fn team(&self) -> Result<Option<AccountAddress>, DisputeError> {
        self.team_address()
    }

    pub fn dispute_params(&self) -> &DisputeParams {
        &self.params
    }
}
