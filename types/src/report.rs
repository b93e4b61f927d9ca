//! The oracle report a dispute is raised against.

use crate::address::AccountAddress;
use crate::error::LayerError;
use crate::hash::HashId;
use crate::state::DisputeCategory;
use crate::time::Timestamp;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};

type Blake2b256 = Blake2b<U32>;

/// A single reporter's submission for one query at one timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicroReport {
    pub reporter: AccountAddress,
    /// Reporting power the reporter held when the report was submitted.
    pub power: u64,
    pub query_type: String,
    pub query_id: Vec<u8>,
    pub aggregate_method: String,
    pub value: String,
    pub timestamp: Timestamp,
    pub cyclelist: bool,
    pub block_number: u64,
}

impl MicroReport {
    /// Identity of a dispute lineage: Blake2b-256 over the encoded report and category.
    pub fn hash_id(&self, category: DisputeCategory) -> Result<HashId, LayerError> {
        let encoded = bincode::serialize(&(self, category))
            .map_err(|e| LayerError::Serialization(e.to_string()))?;
        let mut hasher = Blake2b256::new();
        hasher.update(&encoded);
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        Ok(HashId::new(out))
    }

    /// Key of the disputes-by-reporter index for this report's lineage.
    pub fn reporter_key(&self, hash_id: &HashId) -> String {
        format!("{}:{}", self.reporter, hash_id)
    }
}
