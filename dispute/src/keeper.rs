//! The dispute keeper: owns the store and the collaborator handles.

use crate::collaborators::{LedgerAdapter, ReportingSubsystem, StakeRegistry};
use crate::error::DisputeError;
use crate::events::{DisputeEvent, EventBus};
use layer_store::{BlockInfo, Dispute, DisputeStateStore, PayerInfo, WriteBatch};
use layer_types::{AccountAddress, Amount, DisputeParams, HashId};

/// Entry point for every dispute operation.
///
/// Operations are spread over the `lifecycle`, `vote`, `tally`,
/// `settlement`, `team`, `hooks` and `query` modules as separate `impl`
/// blocks.
///
/// Each operation stages its writes in one [`WriteBatch`] and commits it
/// once. Incoming funds move before the commit and are handed back if a
/// later step fails; outgoing funds move after the commit, so a record that
/// guards a payout is always written before the payout.
pub struct Keeper<S, L, R, O> {
    pub(crate) store: S,
    pub(crate) ledger: L,
    pub(crate) stake: R,
    pub(crate) oracle: O,
    pub(crate) params: DisputeParams,
    events: EventBus,
}

impl<S, L, R, O> Keeper<S, L, R, O>
where
    S: DisputeStateStore,
    L: LedgerAdapter,
    R: StakeRegistry,
    O: ReportingSubsystem,
{
    /// Build a keeper. A team address in `params` seeds the stored one the
    /// first time; after that the stored value wins.
    pub fn new(
        store: S,
        ledger: L,
        stake: R,
        oracle: O,
        params: DisputeParams,
    ) -> Result<Self, DisputeError> {
        if let Some(team) = &params.team_address {
            if store.get_team_address()?.is_none() {
                store.put_team_address(team)?;
            }
        }
        Ok(Self {
            store,
            ledger,
            stake,
            oracle,
            params,
            events: EventBus::new(),
        })
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&DisputeEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn stake_registry(&self) -> &R {
        &self.stake
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn params(&self) -> &DisputeParams {
        &self.params
    }

    pub(crate) fn emit(&self, event: DisputeEvent) {
        self.events.emit(&event);
    }

    pub(crate) fn team_address(&self) -> Result<Option<AccountAddress>, DisputeError> {
        Ok(self.store.get_team_address()?)
    }

    /// The newest round of the lineage `dispute_id` belongs to.
    pub(crate) fn latest_round(&self, dispute_id: u64) -> Result<Dispute, DisputeError> {
        let dispute = self.store.get_dispute(dispute_id)?;
        let ids = self
            .store
            .dispute_ids_by_reporter_key(&dispute.reporter_key())?;
        match ids.last() {
            Some(&last) if last != dispute_id => Ok(self.store.get_dispute(last)?),
            _ => Ok(dispute),
        }
    }

    /// Class denominators as of the current height.
    pub(crate) fn block_snapshot(&self) -> Result<BlockInfo, DisputeError> {
        Ok(BlockInfo {
            total_reporter_power: self.stake.total_reporter_power()?,
            total_user_tips: self.oracle.total_tips()?.raw(),
            total_token_supply: self.ledger.total_supply()?,
        })
    }

    pub(crate) fn commit(&self, batch: WriteBatch) -> Result<(), DisputeError> {
        self.store.commit_batch(batch)?;
        Ok(())
    }

    pub(crate) fn block_info(&self, hash_id: &HashId) -> Result<BlockInfo, DisputeError> {
        self.store
            .get_block_info(hash_id)?
            .ok_or_else(|| DisputeError::not_found("block info", hash_id))
    }

    /// Move a dispute fee into escrow from the payer's account or stake.
    pub(crate) fn pay_dispute_fee(
        &self,
        payer: &AccountAddress,
        amount: Amount,
        from_bond: bool,
        hash_id: &HashId,
    ) -> Result<(), DisputeError> {
        if from_bond {
            self.stake.fee_from_reporter_stake(payer, amount, hash_id)?;
        } else {
            self.ledger.send_to_module(payer, amount)?;
        }
        Ok(())
    }

    /// Hand back a fee payment whose operation failed after it moved.
    pub(crate) fn return_dispute_fee(&self, payment: &PayerInfo, hash_id: &HashId) {
        let returned = if payment.from_bond {
            self.stake
                .fee_refund(&payment.payer, hash_id, payment.amount)
                .and_then(|()| self.ledger.send_module_to_bonded_pool(payment.amount))
        } else {
            self.ledger.send_from_module(&payment.payer, payment.amount)
        };
        match returned {
            Ok(()) => tracing::debug!(
                payer = %payment.payer,
                amount = %payment.amount,
                "dispute fee returned"
            ),
            Err(e) => tracing::error!(
                payer = %payment.payer,
                amount = %payment.amount,
                error = %e,
                "dispute fee could not be returned"
            ),
        }
    }

    /// Put an escrowed slash back on the reporter's stake.
    pub(crate) fn return_slash(&self, dispute: &Dispute) {
        let returned = self
            .stake
            .return_slashed_tokens(dispute.reporter(), dispute.slash_amount, &dispute.hash_id)
            .and_then(|()| self.ledger.send_module_to_bonded_pool(dispute.slash_amount));
        if let Err(e) = returned {
            tracing::error!(
                dispute_id = dispute.dispute_id,
                reporter = %dispute.reporter(),
                slash = %dispute.slash_amount,
                error = %e,
                "escrowed slash could not be returned"
            );
        }
    }

    /// Burn from escrow, skipping zero amounts.
    pub(crate) fn burn(&self, amount: Amount) -> Result<(), DisputeError> {
        if !amount.is_zero() {
            self.ledger.burn_from_module(amount)?;
        }
        Ok(())
    }
}
