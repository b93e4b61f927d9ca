//! Singleton values owned by the dispute engine.

use crate::StoreError;
use layer_types::AccountAddress;

pub trait DisputeMetaStore {
    /// Carried fixed-point remainder, in `POWER_REDUCTION` units of one loya.
    fn get_dust(&self) -> Result<u128, StoreError>;

    fn put_dust(&self, dust: u128) -> Result<(), StoreError>;

    fn get_team_address(&self) -> Result<Option<AccountAddress>, StoreError>;

    fn put_team_address(&self, team: &AccountAddress) -> Result<(), StoreError>;
}
