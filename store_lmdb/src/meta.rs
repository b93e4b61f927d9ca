//! LMDB implementation of DisputeMetaStore.

use heed::RwTxn;
use layer_store::{DisputeMetaStore, StoreError};
use layer_types::AccountAddress;

use crate::environment::LmdbEnvironment;
use crate::keys::decode_u128;
use crate::LmdbError;

const DUST_KEY: &[u8] = b"dust";
const TEAM_KEY: &[u8] = b"team_address";

impl DisputeMetaStore for LmdbEnvironment {
    fn get_dust(&self) -> Result<u128, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        match self.meta_db.get(&rtxn, DUST_KEY).map_err(LmdbError::from)? {
            Some(bytes) => Ok(decode_u128(bytes)?),
            None => Ok(0),
        }
    }

    fn put_dust(&self, dust: u128) -> Result<(), StoreError> {
        Ok(self.update(|txn| self.put_dust_txn(txn, dust))?)
    }

    fn get_team_address(&self) -> Result<Option<AccountAddress>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        match self.meta_db.get(&rtxn, TEAM_KEY).map_err(LmdbError::from)? {
            Some(bytes) => {
                let raw = std::str::from_utf8(bytes)
                    .map_err(|e| LmdbError::Corrupt(format!("team address: {e}")))?;
                let team = AccountAddress::parse(raw)
                    .map_err(|e| LmdbError::Corrupt(format!("team address: {e}")))?;
                Ok(Some(team))
            }
            None => Ok(None),
        }
    }

    fn put_team_address(&self, team: &AccountAddress) -> Result<(), StoreError> {
        Ok(self.update(|txn| self.put_team_address_txn(txn, team))?)
    }
}

impl LmdbEnvironment {
    /// Millionths of a loya, big-endian.
    pub(crate) fn put_dust_txn(&self, txn: &mut RwTxn<'_>, dust: u128) -> Result<(), LmdbError> {
        self.meta_db.put(txn, DUST_KEY, &dust.to_be_bytes())?;
        Ok(())
    }

    pub(crate) fn put_team_address_txn(
        &self,
        txn: &mut RwTxn<'_>,
        team: &AccountAddress,
    ) -> Result<(), LmdbError> {
        self.meta_db.put(txn, TEAM_KEY, team.as_str().as_bytes())?;
        Ok(())
    }
}
