//! Nullable store: thread-safe in-memory dispute state for testing.

use layer_store::{
    BatchStore, BlockInfo, BlockInfoStore, Dispute, DisputeMetaStore, DisputeStore,
    FeePayerStore, PayerInfo, StakeholderVoteCounts, StoreError, StoreWrite, Vote, VoteStore,
    Voter, VoterStore, WriteBatch,
};
use layer_types::{AccountAddress, HashId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

#[derive(Default)]
struct Tables {
    disputes: BTreeMap<u64, Dispute>,
    open: BTreeSet<u64>,
    pending: BTreeSet<u64>,
    by_reporter: HashMap<String, BTreeSet<u64>>,
    next_id: Option<u64>,
    votes: HashMap<u64, Vote>,
    voters: BTreeMap<(u64, AccountAddress), Voter>,
    vote_counts: HashMap<u64, StakeholderVoteCounts>,
    delegated_voted: HashMap<(AccountAddress, u64), u128>,
    fee_payers: BTreeMap<(u64, AccountAddress), PayerInfo>,
    block_info: HashMap<HashId, BlockInfo>,
    dust: u128,
    team: Option<AccountAddress>,
}

impl Tables {
    fn apply(&mut self, write: StoreWrite) {
        match write {
            StoreWrite::PutDispute(dispute) => {
                let id = dispute.dispute_id;
                if dispute.open {
                    self.open.insert(id);
                } else {
                    self.open.remove(&id);
                }
                if dispute.pending_execution {
                    self.pending.insert(id);
                } else {
                    self.pending.remove(&id);
                }
                self.by_reporter
                    .entry(dispute.reporter_key())
                    .or_default()
                    .insert(id);
                self.disputes.insert(id, dispute);
            }
            StoreWrite::SetNextDisputeId(id) => self.next_id = Some(id),
            StoreWrite::PutVote(vote) => {
                self.votes.insert(vote.id, vote);
            }
            StoreWrite::PutVoter {
                dispute_id,
                voter,
                record,
            } => {
                self.voters.insert((dispute_id, voter), record);
            }
            StoreWrite::RemoveVoter { dispute_id, voter } => {
                self.voters.remove(&(dispute_id, voter));
            }
            StoreWrite::PutVoteCounts { dispute_id, counts } => {
                self.vote_counts.insert(dispute_id, counts);
            }
            StoreWrite::PutDelegatedPowerVoted {
                reporter,
                dispute_id,
                power,
            } => {
                self.delegated_voted.insert((reporter, dispute_id), power);
            }
            StoreWrite::PutFeePayer { dispute_id, info } => {
                self.fee_payers.insert((dispute_id, info.payer.clone()), info);
            }
            StoreWrite::RemoveFeePayer { dispute_id, payer } => {
                self.fee_payers.remove(&(dispute_id, payer));
            }
            StoreWrite::PutBlockInfo { hash_id, info } => {
                self.block_info.insert(hash_id, info);
            }
            StoreWrite::RemoveBlockInfo(hash_id) => {
                self.block_info.remove(&hash_id);
            }
            StoreWrite::PutDust(dust) => self.dust = dust,
            StoreWrite::PutTeamAddress(team) => self.team = Some(team),
        }
    }
}

/// Every dispute table in memory behind one lock, so index updates land
/// together with the primary record and a batch lands all at once.
#[derive(Default)]
pub struct NullDisputeStore {
    tables: Mutex<Tables>,
    failing_batches: Mutex<usize>,
    committed_batches: Mutex<usize>,
}

impl NullDisputeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispute_count(&self) -> usize {
        self.tables.lock().unwrap().disputes.len()
    }

    /// Make the next `count` batch commits fail without applying anything.
    pub fn fail_next_batches(&self, count: usize) {
        *self.failing_batches.lock().unwrap() = count;
    }

    /// Number of batches applied so far.
    pub fn committed_batches(&self) -> usize {
        *self.committed_batches.lock().unwrap()
    }

    fn apply(&self, write: StoreWrite) -> Result<(), StoreError> {
        self.tables.lock().unwrap().apply(write);
        Ok(())
    }
}

impl BatchStore for NullDisputeStore {
    fn commit_batch(&self, batch: WriteBatch) -> Result<(), StoreError> {
        {
            let mut failing = self.failing_batches.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(StoreError::Backend("injected batch failure".into()));
            }
        }
        if batch.is_empty() {
            return Ok(());
        }
        let mut t = self.tables.lock().unwrap();
        for write in batch.into_writes() {
            t.apply(write);
        }
        *self.committed_batches.lock().unwrap() += 1;
        Ok(())
    }
}

impl DisputeStore for NullDisputeStore {
    fn get_dispute(&self, id: u64) -> Result<Dispute, StoreError> {
        self.tables
            .lock()
            .unwrap()
            .disputes
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("dispute", id))
    }

    fn put_dispute(&self, dispute: &Dispute) -> Result<(), StoreError> {
        self.apply(StoreWrite::PutDispute(dispute.clone()))
    }

    fn has_dispute(&self, id: u64) -> Result<bool, StoreError> {
        Ok(self.tables.lock().unwrap().disputes.contains_key(&id))
    }

    fn open_dispute_ids(&self) -> Result<Vec<u64>, StoreError> {
        Ok(self.tables.lock().unwrap().open.iter().copied().collect())
    }

    fn pending_execution_ids(&self) -> Result<Vec<u64>, StoreError> {
        Ok(self.tables.lock().unwrap().pending.iter().copied().collect())
    }

    fn dispute_ids_by_reporter_key(&self, key: &str) -> Result<Vec<u64>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .by_reporter
            .get(key)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default())
    }

    fn next_dispute_id(&self) -> Result<u64, StoreError> {
        Ok(self.tables.lock().unwrap().next_id.unwrap_or(1))
    }

    fn set_next_dispute_id(&self, id: u64) -> Result<(), StoreError> {
        self.apply(StoreWrite::SetNextDisputeId(id))
    }

    fn iter_disputes(&self) -> Result<Vec<Dispute>, StoreError> {
        Ok(self.tables.lock().unwrap().disputes.values().cloned().collect())
    }
}

impl VoteStore for NullDisputeStore {
    fn get_vote(&self, id: u64) -> Result<Vote, StoreError> {
        self.tables
            .lock()
            .unwrap()
            .votes
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("vote", id))
    }

    fn put_vote(&self, vote: &Vote) -> Result<(), StoreError> {
        self.apply(StoreWrite::PutVote(vote.clone()))
    }

    fn has_vote(&self, id: u64) -> Result<bool, StoreError> {
        Ok(self.tables.lock().unwrap().votes.contains_key(&id))
    }
}

impl VoterStore for NullDisputeStore {
    fn get_voter(&self, dispute_id: u64, voter: &AccountAddress) -> Result<Voter, StoreError> {
        self.tables
            .lock()
            .unwrap()
            .voters
            .get(&(dispute_id, voter.clone()))
            .cloned()
            .ok_or_else(|| StoreError::not_found("voter", format!("{dispute_id}/{voter}")))
    }

    fn put_voter(
        &self,
        dispute_id: u64,
        voter: &AccountAddress,
        record: &Voter,
    ) -> Result<(), StoreError> {
        self.apply(StoreWrite::PutVoter {
            dispute_id,
            voter: voter.clone(),
            record: record.clone(),
        })
    }

    fn remove_voter(&self, dispute_id: u64, voter: &AccountAddress) -> Result<(), StoreError> {
        self.apply(StoreWrite::RemoveVoter {
            dispute_id,
            voter: voter.clone(),
        })
    }

    fn has_voter(&self, dispute_id: u64, voter: &AccountAddress) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .voters
            .contains_key(&(dispute_id, voter.clone())))
    }

    fn voters_for_dispute(&self, dispute_id: u64) -> Result<Vec<(AccountAddress, Voter)>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .voters
            .iter()
            .filter(|((id, _), _)| *id == dispute_id)
            .map(|((_, addr), v)| (addr.clone(), v.clone()))
            .collect())
    }

    fn get_vote_counts(&self, dispute_id: u64) -> Result<StakeholderVoteCounts, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .vote_counts
            .get(&dispute_id)
            .copied()
            .unwrap_or_default())
    }

    fn put_vote_counts(
        &self,
        dispute_id: u64,
        counts: &StakeholderVoteCounts,
    ) -> Result<(), StoreError> {
        self.apply(StoreWrite::PutVoteCounts {
            dispute_id,
            counts: *counts,
        })
    }

    fn get_delegated_power_voted(
        &self,
        reporter: &AccountAddress,
        dispute_id: u64,
    ) -> Result<Option<u128>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .delegated_voted
            .get(&(reporter.clone(), dispute_id))
            .copied())
    }

    fn put_delegated_power_voted(
        &self,
        reporter: &AccountAddress,
        dispute_id: u64,
        power: u128,
    ) -> Result<(), StoreError> {
        self.apply(StoreWrite::PutDelegatedPowerVoted {
            reporter: reporter.clone(),
            dispute_id,
            power,
        })
    }
}

impl FeePayerStore for NullDisputeStore {
    fn get_fee_payer(
        &self,
        dispute_id: u64,
        payer: &AccountAddress,
    ) -> Result<PayerInfo, StoreError> {
        self.tables
            .lock()
            .unwrap()
            .fee_payers
            .get(&(dispute_id, payer.clone()))
            .cloned()
            .ok_or_else(|| StoreError::not_found("fee payer", format!("{dispute_id}/{payer}")))
    }

    fn put_fee_payer(&self, dispute_id: u64, info: &PayerInfo) -> Result<(), StoreError> {
        self.apply(StoreWrite::PutFeePayer {
            dispute_id,
            info: info.clone(),
        })
    }

    fn remove_fee_payer(&self, dispute_id: u64, payer: &AccountAddress) -> Result<(), StoreError> {
        self.apply(StoreWrite::RemoveFeePayer {
            dispute_id,
            payer: payer.clone(),
        })
    }

    fn fee_payers_for_dispute(&self, dispute_id: u64) -> Result<Vec<PayerInfo>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .fee_payers
            .iter()
            .filter(|((id, _), _)| *id == dispute_id)
            .map(|(_, info)| info.clone())
            .collect())
    }
}

impl BlockInfoStore for NullDisputeStore {
    fn get_block_info(&self, hash_id: &HashId) -> Result<Option<BlockInfo>, StoreError> {
        Ok(self.tables.lock().unwrap().block_info.get(hash_id).copied())
    }

    fn put_block_info(&self, hash_id: &HashId, info: &BlockInfo) -> Result<(), StoreError> {
        self.apply(StoreWrite::PutBlockInfo {
            hash_id: *hash_id,
            info: *info,
        })
    }

    fn remove_block_info(&self, hash_id: &HashId) -> Result<(), StoreError> {
        self.apply(StoreWrite::RemoveBlockInfo(*hash_id))
    }
}

impl DisputeMetaStore for NullDisputeStore {
    fn get_dust(&self) -> Result<u128, StoreError> {
        Ok(self.tables.lock().unwrap().dust)
    }

    fn put_dust(&self, dust: u128) -> Result<(), StoreError> {
        self.apply(StoreWrite::PutDust(dust))
    }

    fn get_team_address(&self) -> Result<Option<AccountAddress>, StoreError> {
        Ok(self.tables.lock().unwrap().team.clone())
    }

    fn put_team_address(&self, team: &AccountAddress) -> Result<(), StoreError> {
        self.apply(StoreWrite::PutTeamAddress(team.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failing_batch_applies_nothing() {
        let store = NullDisputeStore::new();
        store.put_dust(3).unwrap();
        store.fail_next_batches(1);

        let mut batch = WriteBatch::new();
        batch.put_dust(9);
        batch.set_next_dispute_id(4);
        assert!(store.commit_batch(batch.clone()).is_err());
        assert_eq!(store.get_dust().unwrap(), 3);
        assert_eq!(store.next_dispute_id().unwrap(), 1);
        assert_eq!(store.committed_batches(), 0);

        store.commit_batch(batch).unwrap();
        assert_eq!(store.get_dust().unwrap(), 9);
        assert_eq!(store.next_dispute_id().unwrap(), 4);
        assert_eq!(store.committed_batches(), 1);
    }
}
