//! LMDB environment setup.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::migration::Migrator;
use crate::LmdbError;

/// Named databases inside the environment.
pub(crate) const DATABASES: [&str; 11] = [
    "disputes",
    "open_disputes",
    "pending_execution",
    "disputes_by_reporter",
    "votes",
    "voters",
    "vote_counts",
    "delegated_voted",
    "fee_payers",
    "block_info",
    "meta",
];

/// Wraps the LMDB environment and every database handle.
///
/// Implements all of `layer-store`'s traits; see the per-table modules.
pub struct LmdbEnvironment {
    env: Env,
    pub(crate) disputes_db: Database<Bytes, Bytes>,
    pub(crate) open_db: Database<Bytes, Bytes>,
    pub(crate) pending_db: Database<Bytes, Bytes>,
    pub(crate) by_reporter_db: Database<Bytes, Bytes>,
    pub(crate) votes_db: Database<Bytes, Bytes>,
    pub(crate) voters_db: Database<Bytes, Bytes>,
    pub(crate) vote_counts_db: Database<Bytes, Bytes>,
    pub(crate) delegated_db: Database<Bytes, Bytes>,
    pub(crate) fee_payers_db: Database<Bytes, Bytes>,
    pub(crate) block_info_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path and bring its
    /// schema up to date.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        let mut options = EnvOpenOptions::new();
        options.map_size(map_size).max_dbs(DATABASES.len() as u32);
        // SAFETY: the environment is opened once per process per path and
        // never through another handle.
        let env = unsafe { options.open(path)? };

        let mut wtxn = env.write_txn()?;
        let mut dbs = Vec::with_capacity(DATABASES.len());
        for name in DATABASES {
            dbs.push(env.create_database::<Bytes, Bytes>(&mut wtxn, Some(name))?);
        }
        wtxn.commit()?;

        let store = Self {
            env,
            disputes_db: dbs[0],
            open_db: dbs[1],
            pending_db: dbs[2],
            by_reporter_db: dbs[3],
            votes_db: dbs[4],
            voters_db: dbs[5],
            vote_counts_db: dbs[6],
            delegated_db: dbs[7],
            fee_payers_db: dbs[8],
            block_info_db: dbs[9],
            meta_db: dbs[10],
        };
        Migrator::run(&store)?;
        tracing::info!(path = %path.display(), map_size, "dispute store opened");
        Ok(store)
    }

    pub(crate) fn env(&self) -> &Env {
        &self.env
    }

    /// Read and decode one record.
    pub(crate) fn read<T: DeserializeOwned>(
        &self,
        txn: &RoTxn<'_>,
        db: Database<Bytes, Bytes>,
        key: &[u8],
    ) -> Result<Option<T>, LmdbError> {
        match db.get(txn, key)? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    /// Run `f` inside one write transaction and commit it. On error the
    /// transaction is dropped, which aborts every write made through it.
    pub(crate) fn update<F>(&self, f: F) -> Result<(), LmdbError>
    where
        F: FnOnce(&mut RwTxn<'_>) -> Result<(), LmdbError>,
    {
        let mut wtxn = self.env.write_txn()?;
        f(&mut wtxn)?;
        wtxn.commit()?;
        Ok(())
    }

    pub(crate) fn contains(&self, db: Database<Bytes, Bytes>, key: &[u8]) -> Result<bool, LmdbError> {
        let rtxn = self.env.read_txn()?;
        Ok(db.get(&rtxn, key)?.is_some())
    }
}

/// Encode one record and write it inside `txn`.
pub(crate) fn put_encoded<T: Serialize>(
    txn: &mut RwTxn<'_>,
    db: Database<Bytes, Bytes>,
    key: &[u8],
    value: &T,
) -> Result<(), LmdbError> {
    let bytes = bincode::serialize(value)?;
    db.put(txn, key, &bytes)?;
    Ok(())
}
