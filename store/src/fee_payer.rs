//! Fee payer records used for pull-based refunds.

use crate::{PayerInfo, StoreError};
use layer_types::AccountAddress;

/// Keyed by `(root dispute id, payer)`. A record is removed once its refund
/// has been withdrawn.
pub trait FeePayerStore {
    fn get_fee_payer(
        &self,
        dispute_id: u64,
        payer: &AccountAddress,
    ) -> Result<PayerInfo, StoreError>;

    fn put_fee_payer(&self, dispute_id: u64, info: &PayerInfo) -> Result<(), StoreError>;

    fn remove_fee_payer(&self, dispute_id: u64, payer: &AccountAddress) -> Result<(), StoreError>;

    fn fee_payers_for_dispute(&self, dispute_id: u64) -> Result<Vec<PayerInfo>, StoreError>;
}
