//! Capabilities the engine needs from the rest of the chain.
//!
//! The engine never touches balances or stake directly. Anything that moves
//! tokens or reads another module's state goes through one of these traits.
//!
//! Calls that pull tokens into dispute escrow (`escrow_reporter_stake`,
//! `fee_from_reporter_stake`, `send_to_module`) move the tokens themselves.
//! Calls that give stake back (`return_slashed_tokens`, `fee_refund`,
//! `add_amount_to_stake`) only update stake accounting; the engine follows
//! them with [`LedgerAdapter::send_module_to_bonded_pool`].

use layer_types::{AccountAddress, Amount, HashId, JailPolicy, MicroReport, Timestamp};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("rejected: {0}")]
    Rejected(String),
}

/// A selector's delegation to a reporter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delegation {
    pub reporter: AccountAddress,
    pub amount: Amount,
}

/// Bank operations against accounts, the dispute escrow and the bonded pool.
pub trait LedgerAdapter {
    fn balance(&self, account: &AccountAddress) -> Result<Amount, CollaboratorError>;

    /// Account → dispute escrow.
    fn send_to_module(&self, from: &AccountAddress, amount: Amount)
        -> Result<(), CollaboratorError>;

    /// Dispute escrow → account.
    fn send_from_module(&self, to: &AccountAddress, amount: Amount)
        -> Result<(), CollaboratorError>;

    /// Dispute escrow → bonded pool.
    fn send_module_to_bonded_pool(&self, amount: Amount) -> Result<(), CollaboratorError>;

    /// Burn from dispute escrow.
    fn burn_from_module(&self, amount: Amount) -> Result<(), CollaboratorError>;

    fn total_supply(&self) -> Result<Amount, CollaboratorError>;
}

/// Reporter stake, delegation and jailing.
pub trait StakeRegistry {
    fn reporter_total_tokens(&self, reporter: &AccountAddress)
        -> Result<Amount, CollaboratorError>;

    /// Take `amount` of the reporter's stake into dispute escrow.
    fn escrow_reporter_stake(
        &self,
        reporter: &AccountAddress,
        amount: Amount,
        hash_id: &HashId,
    ) -> Result<(), CollaboratorError>;

    fn jail_reporter(
        &self,
        reporter: &AccountAddress,
        policy: JailPolicy,
        now: Timestamp,
    ) -> Result<(), CollaboratorError>;

    /// `None` when the account neither reports nor selects.
    fn delegation(&self, account: &AccountAddress)
        -> Result<Option<Delegation>, CollaboratorError>;

    fn reporter_tokens_at_block(
        &self,
        reporter: &AccountAddress,
        height: u64,
    ) -> Result<Amount, CollaboratorError>;

    fn delegator_tokens_at_block(
        &self,
        delegator: &AccountAddress,
        height: u64,
    ) -> Result<Amount, CollaboratorError>;

    /// Pay a dispute fee out of the payer's stake into dispute escrow.
    fn fee_from_reporter_stake(
        &self,
        payer: &AccountAddress,
        amount: Amount,
        hash_id: &HashId,
    ) -> Result<(), CollaboratorError>;

    /// Credit a fee that was paid from stake back to that stake.
    fn fee_refund(
        &self,
        payer: &AccountAddress,
        hash_id: &HashId,
        amount: Amount,
    ) -> Result<(), CollaboratorError>;

    /// Credit escrowed slash back to the reporter's stake.
    fn return_slashed_tokens(
        &self,
        reporter: &AccountAddress,
        amount: Amount,
        hash_id: &HashId,
    ) -> Result<(), CollaboratorError>;

    fn add_amount_to_stake(
        &self,
        account: &AccountAddress,
        amount: Amount,
    ) -> Result<(), CollaboratorError>;

    fn total_reporter_power(&self) -> Result<u128, CollaboratorError>;
}

/// The oracle: tips and aggregate reports.
pub trait ReportingSubsystem {
    /// Cumulative tips paid by `tipper` up to `height`.
    fn tips_at_block_for_tipper(
        &self,
        tipper: &AccountAddress,
        height: u64,
    ) -> Result<Amount, CollaboratorError>;

    fn total_tips(&self) -> Result<Amount, CollaboratorError>;

    /// Mark an aggregate built from `report` as disputed.
    fn flag_aggregate_report(&self, report: &MicroReport) -> Result<(), CollaboratorError>;
}
