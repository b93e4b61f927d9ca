//! Fundamental types for the layer dispute engine.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, hashes, amounts, timestamps, reports, dispute parameters, and state enums.

pub mod address;
pub mod amount;
pub mod block;
pub mod error;
pub mod hash;
pub mod params;
pub mod report;
pub mod state;
pub mod time;

pub use address::AccountAddress;
pub use amount::{Amount, BOND_DENOM, POWER_REDUCTION};
pub use block::BlockHeader;
pub use error::LayerError;
pub use hash::HashId;
pub use params::DisputeParams;
pub use report::MicroReport;
pub use state::{DisputeCategory, DisputeStatus, JailPolicy, VoteChoice, VoteResult};
pub use time::Timestamp;
