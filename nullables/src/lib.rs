//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator the dispute engine talks to (store, bank, staking,
//! oracle, block clock) has an in-memory stand-in here that:
//! - Returns deterministic values
//! - Can be seeded and inspected programmatically
//! - Never touches the filesystem or network
//!
//! Ledger, stake registry and oracle are cheap to clone and clones share
//! state, so a test can keep a handle after moving one into the keeper.

pub mod clock;
pub mod ledger;
pub mod oracle;
pub mod stake;
pub mod store;

pub use clock::NullBlockClock;
pub use ledger::NullLedger;
pub use oracle::NullOracle;
pub use stake::NullStakeRegistry;
pub use store::NullDisputeStore;
