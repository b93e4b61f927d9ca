//! LMDB storage backend for the layer dispute engine.
//!
//! One heed environment holds every table. [`LmdbEnvironment`] implements all
//! of `layer-store`'s traits, so it satisfies `DisputeStateStore` directly.
//! Single-record methods commit on their own; a `WriteBatch` commits many
//! records in one transaction.

pub mod block_info;
pub mod dispute;
pub mod environment;
pub mod error;
pub mod fee_payer;
mod keys;
pub mod meta;
pub mod migration;
pub mod vote;
pub mod voter;
pub mod write_batch;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
