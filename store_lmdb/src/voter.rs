//! LMDB implementation of VoterStore.
//!
//! Ballots are keyed `dispute_id ++ address`, so a round's ballots come back
//! ordered by address from one prefix scan.

use heed::RwTxn;
use layer_store::{StakeholderVoteCounts, StoreError, Voter, VoterStore};
use layer_types::AccountAddress;

use crate::environment::{put_encoded, LmdbEnvironment};
use crate::keys::{decode_u128, delegated_key, id_key, round_account_key};
use crate::LmdbError;

impl VoterStore for LmdbEnvironment {
    fn get_voter(&self, dispute_id: u64, voter: &AccountAddress) -> Result<Voter, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        self.read(&rtxn, self.voters_db, &round_account_key(dispute_id, voter))?
            .ok_or_else(|| StoreError::not_found("voter", format!("{dispute_id}/{voter}")))
    }

    fn put_voter(
        &self,
        dispute_id: u64,
        voter: &AccountAddress,
        record: &Voter,
    ) -> Result<(), StoreError> {
        Ok(self.update(|txn| self.put_voter_txn(txn, dispute_id, voter, record))?)
    }

    fn remove_voter(&self, dispute_id: u64, voter: &AccountAddress) -> Result<(), StoreError> {
        Ok(self.update(|txn| self.remove_voter_txn(txn, dispute_id, voter))?)
    }

    fn has_voter(&self, dispute_id: u64, voter: &AccountAddress) -> Result<bool, StoreError> {
        Ok(self.contains(self.voters_db, &round_account_key(dispute_id, voter))?)
    }

    fn voters_for_dispute(
        &self,
        dispute_id: u64,
    ) -> Result<Vec<(AccountAddress, Voter)>, StoreError> {
        let prefix = id_key(dispute_id);
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let iter = self
            .voters_db
            .prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for entry in iter {
            let (key, val) = entry.map_err(LmdbError::from)?;
            let addr = std::str::from_utf8(&key[prefix.len()..])
                .map_err(|e| LmdbError::Corrupt(format!("voter key: {e}")))?;
            let voter: Voter = bincode::deserialize(val).map_err(LmdbError::from)?;
            out.push((AccountAddress::new(addr), voter));
        }
        Ok(out)
    }

    fn get_vote_counts(&self, dispute_id: u64) -> Result<StakeholderVoteCounts, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        Ok(self
            .read(&rtxn, self.vote_counts_db, &id_key(dispute_id))?
            .unwrap_or_default())
    }

    fn put_vote_counts(
        &self,
        dispute_id: u64,
        counts: &StakeholderVoteCounts,
    ) -> Result<(), StoreError> {
        Ok(self.update(|txn| self.put_vote_counts_txn(txn, dispute_id, counts))?)
    }

    fn get_delegated_power_voted(
        &self,
        reporter: &AccountAddress,
        dispute_id: u64,
    ) -> Result<Option<u128>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        match self
            .delegated_db
            .get(&rtxn, &delegated_key(reporter, dispute_id))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode_u128(bytes)?)),
            None => Ok(None),
        }
    }

    fn put_delegated_power_voted(
        &self,
        reporter: &AccountAddress,
        dispute_id: u64,
        power: u128,
    ) -> Result<(), StoreError> {
        Ok(self.update(|txn| {
            self.put_delegated_power_voted_txn(txn, reporter, dispute_id, power)
        })?)
    }
}

impl LmdbEnvironment {
    pub(crate) fn put_voter_txn(
        &self,
        txn: &mut RwTxn<'_>,
        dispute_id: u64,
        voter: &AccountAddress,
        record: &Voter,
    ) -> Result<(), LmdbError> {
        put_encoded(txn, self.voters_db, &round_account_key(dispute_id, voter), record)
    }

    pub(crate) fn remove_voter_txn(
        &self,
        txn: &mut RwTxn<'_>,
        dispute_id: u64,
        voter: &AccountAddress,
    ) -> Result<(), LmdbError> {
        self.voters_db
            .delete(txn, &round_account_key(dispute_id, voter))?;
        Ok(())
    }

    pub(crate) fn put_vote_counts_txn(
        &self,
        txn: &mut RwTxn<'_>,
        dispute_id: u64,
        counts: &StakeholderVoteCounts,
    ) -> Result<(), LmdbError> {
        put_encoded(txn, self.vote_counts_db, &id_key(dispute_id), counts)
    }

    pub(crate) fn put_delegated_power_voted_txn(
        &self,
        txn: &mut RwTxn<'_>,
        reporter: &AccountAddress,
        dispute_id: u64,
        power: u128,
    ) -> Result<(), LmdbError> {
        self.delegated_db
            .put(txn, &delegated_key(reporter, dispute_id), &power.to_be_bytes())?;
        Ok(())
    }
}
