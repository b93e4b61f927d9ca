//! Snapshot of the class denominators at the height a dispute opened.

use crate::StoreError;
use layer_types::{Amount, HashId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub total_reporter_power: u128,
    pub total_user_tips: u128,
    pub total_token_supply: Amount,
}

/// Keyed by the lineage hash. Removed once the lineage is settled.
pub trait BlockInfoStore {
    fn get_block_info(&self, hash_id: &HashId) -> Result<Option<BlockInfo>, StoreError>;

    fn put_block_info(&self, hash_id: &HashId, info: &BlockInfo) -> Result<(), StoreError>;

    fn remove_block_info(&self, hash_id: &HashId) -> Result<(), StoreError>;
}
