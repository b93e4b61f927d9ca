//! LMDB implementation of DisputeStore.
//!
//! The primary record and its three indexes are always written in the same
//! transaction.

use heed::RwTxn;
use layer_store::{Dispute, DisputeStore, StoreError};

use crate::environment::{put_encoded, LmdbEnvironment};
use crate::keys::{decode_id, id_key, reporter_prefix, reporter_round_key};
use crate::LmdbError;

const NEXT_ID_KEY: &[u8] = b"next_dispute_id";

impl DisputeStore for LmdbEnvironment {
    fn get_dispute(&self, id: u64) -> Result<Dispute, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        self.read(&rtxn, self.disputes_db, &id_key(id))?
            .ok_or_else(|| StoreError::not_found("dispute", id))
    }

    fn put_dispute(&self, dispute: &Dispute) -> Result<(), StoreError> {
        Ok(self.update(|txn| self.put_dispute_txn(txn, dispute))?)
    }

    fn has_dispute(&self, id: u64) -> Result<bool, StoreError> {
        Ok(self.contains(self.disputes_db, &id_key(id))?)
    }

    fn open_dispute_ids(&self) -> Result<Vec<u64>, StoreError> {
        Ok(index_ids(self, IndexKind::Open)?)
    }

    fn pending_execution_ids(&self) -> Result<Vec<u64>, StoreError> {
        Ok(index_ids(self, IndexKind::Pending)?)
    }

    fn dispute_ids_by_reporter_key(&self, key: &str) -> Result<Vec<u64>, StoreError> {
        let prefix = reporter_prefix(key);
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let iter = self
            .by_reporter_db
            .prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?;
        let mut ids = Vec::new();
        for entry in iter {
            let (_, val) = entry.map_err(LmdbError::from)?;
            ids.push(decode_id(val)?);
        }
        Ok(ids)
    }

    fn next_dispute_id(&self) -> Result<u64, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        match self.meta_db.get(&rtxn, NEXT_ID_KEY).map_err(LmdbError::from)? {
            Some(bytes) => Ok(decode_id(bytes)?),
            None => Ok(1),
        }
    }

    fn set_next_dispute_id(&self, id: u64) -> Result<(), StoreError> {
        Ok(self.update(|txn| self.set_next_dispute_id_txn(txn, id))?)
    }

    fn iter_disputes(&self) -> Result<Vec<Dispute>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for entry in self.disputes_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, val) = entry.map_err(LmdbError::from)?;
            out.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(out)
    }
}

impl LmdbEnvironment {
    /// Primary record plus its open, pending and by-reporter index entries.
    pub(crate) fn put_dispute_txn(
        &self,
        txn: &mut RwTxn<'_>,
        dispute: &Dispute,
    ) -> Result<(), LmdbError> {
        let id = dispute.dispute_id;
        let key = id_key(id);
        put_encoded(txn, self.disputes_db, &key, dispute)?;
        if dispute.open {
            self.open_db.put(txn, &key, &[])?;
        } else {
            self.open_db.delete(txn, &key)?;
        }
        if dispute.pending_execution {
            self.pending_db.put(txn, &key, &[])?;
        } else {
            self.pending_db.delete(txn, &key)?;
        }
        self.by_reporter_db
            .put(txn, &reporter_round_key(&dispute.reporter_key(), id), &key)?;
        Ok(())
    }

    pub(crate) fn set_next_dispute_id_txn(
        &self,
        txn: &mut RwTxn<'_>,
        id: u64,
    ) -> Result<(), LmdbError> {
        self.meta_db.put(txn, NEXT_ID_KEY, &id_key(id))?;
        Ok(())
    }
}

enum IndexKind {
    Open,
    Pending,
}

fn index_ids(env: &LmdbEnvironment, kind: IndexKind) -> Result<Vec<u64>, LmdbError> {
    let db = match kind {
        IndexKind::Open => env.open_db,
        IndexKind::Pending => env.pending_db,
    };
    let rtxn = env.env().read_txn()?;
    let mut ids = Vec::new();
    for entry in db.iter(&rtxn)? {
        let (key, _) = entry?;
        ids.push(decode_id(key)?);
    }
    Ok(ids)
}
