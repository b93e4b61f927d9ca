//! Dispute voting and settlement engine.
//!
//! A dispute contests one oracle report. Fee payers fund it during
//! **prevote**; once the fee equals the slash amount the reporter is slashed
//! and jailed and a **vote** opens. Four stakeholder classes (users,
//! reporters, tokenholders, team) vote with independently normalized power.
//! A vote that ends without a majority leaves the dispute **unresolved**, and
//! anyone may escalate it into a new round with a doubled burn. Once
//! resolved, **settlement** burns half the burn amount, keeps the other half
//! for voters, and returns or redistributes the slashed bond. Fee refunds and
//! voter rewards are pulled by their recipients.
//!
//! The engine is block-synchronous: every entry point takes the current
//! [`BlockHeader`](layer_types::BlockHeader) and never reads the system clock.

pub mod collaborators;
pub mod error;
pub mod events;
pub mod hooks;
pub mod keeper;
pub mod lifecycle;
pub mod math;
pub mod query;
pub mod settlement;
pub mod tally;
pub mod team;
pub mod vote;

pub use collaborators::{
    CollaboratorError, Delegation, LedgerAdapter, ReportingSubsystem, StakeRegistry,
};
pub use error::DisputeError;
pub use events::{DisputeEvent, EventBus};
pub use hooks::BlockReport;
pub use keeper::Keeper;
pub use math::{Dust, Share};
pub use tally::{ScaledTally, TallyOutcome};
