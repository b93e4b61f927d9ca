//! Dispute records and the primary dispute table.

use crate::StoreError;
use layer_types::{
    AccountAddress, Amount, DisputeCategory, DisputeStatus, HashId, MicroReport, Timestamp,
};
use serde::{Deserialize, Serialize};

/// One contribution towards a dispute fee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayerInfo {
    pub payer: AccountAddress,
    pub amount: Amount,
    /// Paid out of the payer's reporting stake rather than their account.
    pub from_bond: bool,
    pub block_number: u64,
}

/// A single round of a dispute against one report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    pub hash_id: HashId,
    pub dispute_id: u64,
    pub category: DisputeCategory,
    /// Fee that must be collected before voting starts.
    pub dispute_fee: Amount,
    pub status: DisputeStatus,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub start_block: u64,
    pub round: u32,
    pub slash_amount: Amount,
    /// Forfeited on settlement; doubles with every round.
    pub burn_amount: Amount,
    pub initial_evidence: MicroReport,
    pub additional_evidence: Vec<MicroReport>,
    pub fee_total: Amount,
    pub fee_payers: Vec<PayerInfo>,
    /// Every round id of this lineage in order, this round included.
    pub prev_dispute_ids: Vec<u64>,
    /// Height the lineage was opened at; snapshots are taken at this height.
    pub block_number: u64,
    pub open: bool,
    pub pending_execution: bool,
    pub voter_reward: Amount,
}

impl Dispute {
    /// Id of the first round; fee payers are keyed by it.
    pub fn root_id(&self) -> u64 {
        self.prev_dispute_ids
            .first()
            .copied()
            .unwrap_or(self.dispute_id)
    }

    pub fn reporter(&self) -> &AccountAddress {
        &self.initial_evidence.reporter
    }

    pub fn reporter_key(&self) -> String {
        self.initial_evidence.reporter_key(&self.hash_id)
    }

    pub fn is_fee_met(&self) -> bool {
        self.fee_total >= self.slash_amount
    }

    /// Fee still needed before voting can start.
    pub fn fee_remaining(&self) -> Amount {
        self.slash_amount.saturating_sub(self.fee_total)
    }

    /// Ids of every round, deduplicated, in round order.
    pub fn lineage(&self) -> Vec<u64> {
        let mut ids = Vec::with_capacity(self.prev_dispute_ids.len() + 1);
        for id in self
            .prev_dispute_ids
            .iter()
            .copied()
            .chain(std::iter::once(self.dispute_id))
        {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

/// Primary dispute table plus its secondary indexes.
///
/// Implementations maintain the open, pending-execution and by-reporter
/// indexes inside the same write as the primary record.
pub trait DisputeStore {
    fn get_dispute(&self, id: u64) -> Result<Dispute, StoreError>;

    /// Insert or overwrite a dispute and update every index to match.
    fn put_dispute(&self, dispute: &Dispute) -> Result<(), StoreError>;

    fn has_dispute(&self, id: u64) -> Result<bool, StoreError>;

    /// Ids of disputes with `open == true`, ascending.
    fn open_dispute_ids(&self) -> Result<Vec<u64>, StoreError>;

    /// Ids of disputes flagged for execution, ascending.
    fn pending_execution_ids(&self) -> Result<Vec<u64>, StoreError>;

    /// Every round id recorded under a reporter key, ascending.
    fn dispute_ids_by_reporter_key(&self, key: &str) -> Result<Vec<u64>, StoreError>;

    /// Next id to hand out. Starts at 1.
    fn next_dispute_id(&self) -> Result<u64, StoreError>;

    fn set_next_dispute_id(&self, id: u64) -> Result<(), StoreError>;

    /// All disputes, ascending by id.
    fn iter_disputes(&self) -> Result<Vec<Dispute>, StoreError>;
}
