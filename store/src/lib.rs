//! Abstract storage traits for the layer dispute engine.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The engine depends only on the traits.

pub mod batch;
pub mod block_info;
pub mod dispute;
pub mod error;
pub mod fee_payer;
pub mod meta;
pub mod vote;
pub mod voter;

pub use batch::{BatchStore, StoreWrite, WriteBatch};
pub use block_info::{BlockInfo, BlockInfoStore};
pub use dispute::{Dispute, DisputeStore, PayerInfo};
pub use error::StoreError;
pub use fee_payer::FeePayerStore;
pub use meta::DisputeMetaStore;
pub use vote::{Tally, Vote, VoteStore};
pub use voter::{StakeholderClass, StakeholderVoteCounts, VoteCounts, Voter, VoterStore};

/// Everything the dispute engine persists.
///
/// Blanket-implemented for any backend that provides every table and can
/// commit a [`WriteBatch`] atomically.
pub trait DisputeStateStore:
    DisputeStore
    + VoteStore
    + VoterStore
    + FeePayerStore
    + BlockInfoStore
    + DisputeMetaStore
    + BatchStore
{
}

impl<T> DisputeStateStore for T where
    T: DisputeStore
        + VoteStore
        + VoterStore
        + FeePayerStore
        + BlockInfoStore
        + DisputeMetaStore
        + BatchStore
{
}
