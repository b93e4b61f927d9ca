//! Atomic commit of a staged [`WriteBatch`].
//!
//! Every write in the batch goes through one LMDB write transaction. If any
//! write fails the transaction is dropped and nothing from the batch is
//! visible.

use heed::RwTxn;
use layer_store::{BatchStore, StoreError, StoreWrite, WriteBatch};

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

impl BatchStore for LmdbEnvironment {
    fn commit_batch(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let count = batch.len();
        self.update(|txn| {
            for write in batch.writes() {
                self.apply_write(txn, write)?;
            }
            Ok(())
        })?;
        tracing::trace!(count, "write batch committed");
        Ok(())
    }
}

impl LmdbEnvironment {
    fn apply_write(&self, txn: &mut RwTxn<'_>, write: &StoreWrite) -> Result<(), LmdbError> {
        match write {
            StoreWrite::PutDispute(dispute) => self.put_dispute_txn(txn, dispute),
            StoreWrite::SetNextDisputeId(id) => self.set_next_dispute_id_txn(txn, *id),
            StoreWrite::PutVote(vote) => self.put_vote_txn(txn, vote),
            StoreWrite::PutVoter {
                dispute_id,
                voter,
                record,
            } => self.put_voter_txn(txn, *dispute_id, voter, record),
            StoreWrite::RemoveVoter { dispute_id, voter } => {
                self.remove_voter_txn(txn, *dispute_id, voter)
            }
            StoreWrite::PutVoteCounts { dispute_id, counts } => {
                self.put_vote_counts_txn(txn, *dispute_id, counts)
            }
            StoreWrite::PutDelegatedPowerVoted {
                reporter,
                dispute_id,
                power,
            } => self.put_delegated_power_voted_txn(txn, reporter, *dispute_id, *power),
            StoreWrite::PutFeePayer { dispute_id, info } => {
                self.put_fee_payer_txn(txn, *dispute_id, info)
            }
            StoreWrite::RemoveFeePayer { dispute_id, payer } => {
                self.remove_fee_payer_txn(txn, *dispute_id, payer)
            }
            StoreWrite::PutBlockInfo { hash_id, info } => {
                self.put_block_info_txn(txn, hash_id, info)
            }
            StoreWrite::RemoveBlockInfo(hash_id) => self.remove_block_info_txn(txn, hash_id),
            StoreWrite::PutDust(dust) => self.put_dust_txn(txn, *dust),
            StoreWrite::PutTeamAddress(team) => self.put_team_address_txn(txn, team),
        }
    }
}
