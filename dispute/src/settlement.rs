//! Settlement: executing a decided vote, fee refunds and voter rewards.
//!
//! Execution only moves the reporter's side of the escrow and burns.
//! Fee payers and voters pull their shares afterwards through
//! [`Keeper::withdraw_fee_refund`] and [`Keeper::claim_reward`].
//!
//! Each of these stores the record that stops a second payout (executed
//! flag, removed fee payer, claimed ballots) before any tokens leave escrow.

use crate::collaborators::{LedgerAdapter, ReportingSubsystem, StakeRegistry};
use crate::error::DisputeError;
use crate::events::DisputeEvent;
use crate::keeper::Keeper;
use crate::math::{
    calculate_refund_amount, calculate_reporter_bond_reward_amount, normalized_fraction, Dust,
    Share,
};
use layer_store::{Dispute, DisputeStateStore, StakeholderClass, Voter, WriteBatch};
use layer_types::{AccountAddress, Amount, BlockHeader, DisputeStatus, VoteChoice};

impl<S, L, R, O> Keeper<S, L, R, O>
where
    S: DisputeStateStore,
    L: LedgerAdapter,
    R: StakeRegistry,
    O: ReportingSubsystem,
{
    /// Settle a decided round. Runs once per id.
    ///
    /// Half of the burn amount is burned and the rest is kept for voters; if
    /// no user, reporter or tokenholder voted anywhere in the lineage the
    /// whole burn amount is burned. An invalid result returns the slash to
    /// the reporter; a rejected dispute returns the slash plus the fee pot.
    pub fn execute_vote(&self, dispute_id: u64, block: &BlockHeader) -> Result<(), DisputeError> {
        let mut dispute = self.store.get_dispute(dispute_id)?;
        let mut vote = self.store.get_vote(dispute_id)?;

        if vote.result.is_tallied()
            && dispute.status == DisputeStatus::Unresolved
            && dispute.end_time.is_before(block.time)
        {
            dispute.status = DisputeStatus::Resolved;
        }
        if dispute.status != DisputeStatus::Resolved {
            return Err(DisputeError::InvalidState(format!(
                "can't execute dispute {dispute_id}; status {}",
                dispute.status
            )));
        }
        if vote.executed {
            return Err(DisputeError::AlreadyDone(format!(
                "vote {dispute_id} already executed"
            )));
        }
        let outcome = vote.result.outcome().ok_or_else(|| {
            DisputeError::InvalidState(format!("vote {dispute_id} hasn't been tallied"))
        })?;

        let lineage = self.lineage_vote_counts(dispute_id)?;
        let rewarded_power = StakeholderClass::REWARDED
            .iter()
            .fold(0u128, |acc, c| acc.saturating_add(lineage.class(*c).total()));
        let half = dispute
            .burn_amount
            .checked_div(2)
            .ok_or(DisputeError::Arithmetic("half burn"))?;
        let (to_burn, voter_reward) = if rewarded_power == 0 {
            (dispute.burn_amount, Amount::ZERO)
        } else {
            (half, dispute.burn_amount - half)
        };

        let reporter_return = match outcome {
            VoteChoice::Invalid => dispute.slash_amount,
            VoteChoice::Support => Amount::ZERO,
            VoteChoice::Against => dispute
                .slash_amount
                .checked_add(refund_pot(&dispute))
                .ok_or(DisputeError::Arithmetic("reporter return overflow"))?,
        };

        vote.executed = true;
        dispute.voter_reward = voter_reward;
        dispute.open = false;
        dispute.pending_execution = false;
        let mut batch = WriteBatch::new();
        batch.put_vote(&vote);
        batch.put_dispute(&dispute);
        batch.remove_block_info(&dispute.hash_id);
        self.commit(batch)?;

        self.burn(to_burn)?;
        if !reporter_return.is_zero() {
            self.stake
                .return_slashed_tokens(dispute.reporter(), reporter_return, &dispute.hash_id)?;
            self.ledger.send_module_to_bonded_pool(reporter_return)?;
        }

        tracing::info!(
            dispute_id,
            result = %vote.result,
            burned = %to_burn,
            voter_reward = %voter_reward,
            reporter_return = %reporter_return,
            "dispute executed"
        );
        self.emit(DisputeEvent::Executed {
            dispute_id,
            result: vote.result,
            burned: to_burn,
            voter_reward,
        });
        Ok(())
    }

    /// Pay a first-round fee payer what they are owed.
    ///
    /// Failed and invalid disputes refund 95% pro-rata; a supported dispute
    /// also pays out the reporter's bond pro-rata. Fees are forfeited when
    /// the reporter wins. `dispute_id` may name any round of the lineage.
    pub fn withdraw_fee_refund(
        &self,
        payer: &AccountAddress,
        dispute_id: u64,
    ) -> Result<Amount, DisputeError> {
        let latest = self.latest_round(dispute_id)?;
        let root_id = latest.root_id();
        let info = self.store.get_fee_payer(root_id, payer)?;

        let (refund, bond_reward) = match latest.status {
            DisputeStatus::Failed => (
                calculate_refund_amount(info.amount, latest.fee_total, latest.fee_total)?,
                Share::default(),
            ),
            DisputeStatus::Resolved => {
                let vote = self.store.get_vote(latest.dispute_id)?;
                if !vote.executed {
                    return Err(DisputeError::InvalidState(format!(
                        "vote {} not executed",
                        latest.dispute_id
                    )));
                }
                match vote.result.outcome() {
                    Some(VoteChoice::Invalid) => (
                        calculate_refund_amount(info.amount, latest.fee_total, latest.fee_total)?,
                        Share::default(),
                    ),
                    Some(VoteChoice::Support) => (
                        calculate_refund_amount(info.amount, latest.fee_total, latest.fee_total)?,
                        calculate_reporter_bond_reward_amount(
                            info.amount,
                            latest.fee_total,
                            latest.slash_amount,
                        )?,
                    ),
                    _ => {
                        return Err(DisputeError::InvalidState(format!(
                            "dispute {} settled as {}; fees are not refundable",
                            latest.dispute_id, vote.result
                        )))
                    }
                }
            }
            status => {
                return Err(DisputeError::InvalidState(format!(
                    "dispute {} is {status}; nothing to refund yet",
                    latest.dispute_id
                )))
            }
        };

        let dust = Dust::new(self.store.get_dust()?);
        let (burn_a, dust) = dust.fold(refund.dust)?;
        let (burn_b, dust) = dust.fold(bond_reward.dust)?;
        let dust_burn = burn_a
            .checked_add(burn_b)
            .ok_or(DisputeError::Arithmetic("dust burn overflow"))?;

        let mut batch = WriteBatch::new();
        batch.put_dust(dust.raw());
        batch.remove_fee_payer(root_id, payer);
        self.commit(batch)?;

        if !refund.amount.is_zero() {
            if info.from_bond {
                self.stake.fee_refund(payer, &latest.hash_id, refund.amount)?;
                self.ledger.send_module_to_bonded_pool(refund.amount)?;
            } else {
                self.ledger.send_from_module(payer, refund.amount)?;
            }
        }
        if !bond_reward.amount.is_zero() {
            self.stake.add_amount_to_stake(payer, bond_reward.amount)?;
            self.ledger.send_module_to_bonded_pool(bond_reward.amount)?;
        }
        self.burn(dust_burn)?;

        tracing::info!(
            dispute_id = latest.dispute_id,
            payer = %payer,
            refund = %refund.amount,
            bond_reward = %bond_reward.amount,
            dust = dust.raw(),
            "fee refund withdrawn"
        );
        self.emit(DisputeEvent::FeeRefunded {
            dispute_id: latest.dispute_id,
            payer: payer.clone(),
            refund: refund.amount,
            bond_reward: bond_reward.amount,
        });
        refund
            .amount
            .checked_add(bond_reward.amount)
            .ok_or(DisputeError::Arithmetic("payout overflow"))
    }

    /// Pay a voter their share of the lineage's voter reward.
    ///
    /// Every ballot the address cast in any round is marked claimed before
    /// the transfer. `dispute_id` may name any round of the lineage.
    pub fn claim_reward(
        &self,
        voter: &AccountAddress,
        dispute_id: u64,
    ) -> Result<Amount, DisputeError> {
        let latest = self.latest_round(dispute_id)?;
        if latest.status != DisputeStatus::Resolved {
            return Err(DisputeError::InvalidState(format!(
                "dispute {} not resolved",
                latest.dispute_id
            )));
        }
        let vote = self.store.get_vote(latest.dispute_id)?;
        if !vote.executed {
            return Err(DisputeError::InvalidState(format!(
                "vote {} not executed",
                latest.dispute_id
            )));
        }

        let ballots = self.lineage_ballots(&latest, voter)?;
        if ballots.is_empty() {
            return Err(DisputeError::not_found(
                "voter",
                format!("{voter} in dispute {}", latest.dispute_id),
            ));
        }
        if ballots.iter().any(|(_, b)| b.reward_claimed) {
            return Err(DisputeError::AlreadyDone(format!(
                "{voter} already claimed the reward for dispute {}",
                latest.dispute_id
            )));
        }

        let reward = self.calculate_reward(voter, latest.dispute_id)?;
        if reward.amount.is_zero() {
            return Err(DisputeError::ZeroReward);
        }
        let (dust_burn, dust) = Dust::new(self.store.get_dust()?).fold(reward.dust)?;

        let mut batch = WriteBatch::new();
        for (round, mut ballot) in ballots {
            ballot.reward_claimed = true;
            batch.put_voter(round, voter, &ballot);
        }
        batch.put_dust(dust.raw());
        self.commit(batch)?;

        self.ledger.send_from_module(voter, reward.amount)?;
        self.burn(dust_burn)?;

        tracing::info!(
            dispute_id = latest.dispute_id,
            voter = %voter,
            amount = %reward.amount,
            "voter reward claimed"
        );
        self.emit(DisputeEvent::RewardClaimed {
            dispute_id: latest.dispute_id,
            voter: voter.clone(),
            amount: reward.amount,
        });
        Ok(reward.amount)
    }

    /// A voter's share of the voter reward.
    ///
    /// For each rewarded class with any power cast in the lineage, the voter's
    /// lineage power is divided by the lineage total. The fractions are
    /// averaged over those classes and applied to the reward.
    pub fn calculate_reward(
        &self,
        voter: &AccountAddress,
        dispute_id: u64,
    ) -> Result<Share, DisputeError> {
        let dispute = self.store.get_dispute(dispute_id)?;
        let lineage = self.lineage_vote_counts(dispute_id)?;
        let ballots = self.lineage_ballots(&dispute, voter)?;

        let mut fraction_sum = 0u128;
        let mut active = 0u128;
        for class in StakeholderClass::REWARDED {
            let total = lineage.class(class).total();
            if total == 0 {
                continue;
            }
            active += 1;
            let mine = ballots
                .iter()
                .fold(0u128, |acc, (_, b)| acc.saturating_add(b.class_power(class)));
            fraction_sum += normalized_fraction(mine, total)?;
        }
        if active == 0 {
            return Ok(Share::default());
        }
        let scaled = dispute
            .voter_reward
            .raw()
            .checked_mul(fraction_sum)
            .map(|v| v / active)
            .ok_or(DisputeError::Arithmetic("reward overflow"))?;
        Ok(Share::from_scaled(scaled))
    }

    fn lineage_ballots(
        &self,
        dispute: &Dispute,
        voter: &AccountAddress,
    ) -> Result<Vec<(u64, Voter)>, DisputeError> {
        let mut ballots = Vec::new();
        for round in dispute.lineage() {
            if self.store.has_voter(round, voter)? {
                ballots.push((round, self.store.get_voter(round, voter)?));
            }
        }
        Ok(ballots)
    }
}

/// First-round fees minus the 5% burn: what payers get back, or what the
/// reporter receives on top of the slash when the dispute is rejected.
fn refund_pot(dispute: &Dispute) -> Amount {
    dispute.fee_total - Amount::new(dispute.fee_total.raw() / 20)
}
