//! LMDB implementation of VoteStore.

use heed::RwTxn;
use layer_store::{StoreError, Vote, VoteStore};

use crate::environment::{put_encoded, LmdbEnvironment};
use crate::keys::id_key;
use crate::LmdbError;

impl VoteStore for LmdbEnvironment {
    fn get_vote(&self, id: u64) -> Result<Vote, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        self.read(&rtxn, self.votes_db, &id_key(id))?
            .ok_or_else(|| StoreError::not_found("vote", id))
    }

    fn put_vote(&self, vote: &Vote) -> Result<(), StoreError> {
        Ok(self.update(|txn| self.put_vote_txn(txn, vote))?)
    }

    fn has_vote(&self, id: u64) -> Result<bool, StoreError> {
        Ok(self.contains(self.votes_db, &id_key(id))?)
    }
}

impl LmdbEnvironment {
    pub(crate) fn put_vote_txn(&self, txn: &mut RwTxn<'_>, vote: &Vote) -> Result<(), LmdbError> {
        put_encoded(txn, self.votes_db, &id_key(vote.id), vote)
    }
}
