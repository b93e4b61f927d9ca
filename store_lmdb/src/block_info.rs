//! LMDB implementation of BlockInfoStore, keyed by the 32-byte lineage hash.

use heed::RwTxn;
use layer_store::{BlockInfo, BlockInfoStore, StoreError};
use layer_types::HashId;

use crate::environment::{put_encoded, LmdbEnvironment};
use crate::LmdbError;

impl BlockInfoStore for LmdbEnvironment {
    fn get_block_info(&self, hash_id: &HashId) -> Result<Option<BlockInfo>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        Ok(self.read(&rtxn, self.block_info_db, hash_id.as_bytes())?)
    }

    fn put_block_info(&self, hash_id: &HashId, info: &BlockInfo) -> Result<(), StoreError> {
        Ok(self.update(|txn| self.put_block_info_txn(txn, hash_id, info))?)
    }

    fn remove_block_info(&self, hash_id: &HashId) -> Result<(), StoreError> {
        Ok(self.update(|txn| self.remove_block_info_txn(txn, hash_id))?)
    }
}

impl LmdbEnvironment {
    pub(crate) fn put_block_info_txn(
        &self,
        txn: &mut RwTxn<'_>,
        hash_id: &HashId,
        info: &BlockInfo,
    ) -> Result<(), LmdbError> {
        put_encoded(txn, self.block_info_db, hash_id.as_bytes(), info)
    }

    pub(crate) fn remove_block_info_txn(
        &self,
        txn: &mut RwTxn<'_>,
        hash_id: &HashId,
    ) -> Result<(), LmdbError> {
        self.block_info_db.delete(txn, hash_id.as_bytes().as_slice())?;
        Ok(())
    }
}
