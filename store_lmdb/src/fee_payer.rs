//! LMDB implementation of FeePayerStore.

use heed::RwTxn;
use layer_store::{FeePayerStore, PayerInfo, StoreError};
use layer_types::AccountAddress;

use crate::environment::{put_encoded, LmdbEnvironment};
use crate::keys::{id_key, round_account_key};
use crate::LmdbError;

impl FeePayerStore for LmdbEnvironment {
    fn get_fee_payer(
        &self,
        dispute_id: u64,
        payer: &AccountAddress,
    ) -> Result<PayerInfo, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        self.read(&rtxn, self.fee_payers_db, &round_account_key(dispute_id, payer))?
            .ok_or_else(|| StoreError::not_found("fee payer", format!("{dispute_id}/{payer}")))
    }

    fn put_fee_payer(&self, dispute_id: u64, info: &PayerInfo) -> Result<(), StoreError> {
        Ok(self.update(|txn| self.put_fee_payer_txn(txn, dispute_id, info))?)
    }

    fn remove_fee_payer(&self, dispute_id: u64, payer: &AccountAddress) -> Result<(), StoreError> {
        Ok(self.update(|txn| self.remove_fee_payer_txn(txn, dispute_id, payer))?)
    }

    fn fee_payers_for_dispute(&self, dispute_id: u64) -> Result<Vec<PayerInfo>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let iter = self
            .fee_payers_db
            .prefix_iter(&rtxn, &id_key(dispute_id))
            .map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for entry in iter {
            let (_, val) = entry.map_err(LmdbError::from)?;
            out.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(out)
    }
}

impl LmdbEnvironment {
    pub(crate) fn put_fee_payer_txn(
        &self,
        txn: &mut RwTxn<'_>,
        dispute_id: u64,
        info: &PayerInfo,
    ) -> Result<(), LmdbError> {
        put_encoded(
            txn,
            self.fee_payers_db,
            &round_account_key(dispute_id, &info.payer),
            info,
        )
    }

    pub(crate) fn remove_fee_payer_txn(
        &self,
        txn: &mut RwTxn<'_>,
        dispute_id: u64,
        payer: &AccountAddress,
    ) -> Result<(), LmdbError> {
        self.fee_payers_db
            .delete(txn, &round_account_key(dispute_id, payer))?;
        Ok(())
    }
}
