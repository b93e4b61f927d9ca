//! Casting ballots and determining each voter's power per class.

use crate::collaborators::{CollaboratorError, LedgerAdapter, ReportingSubsystem, StakeRegistry};
use crate::error::DisputeError;
use crate::events::DisputeEvent;
use crate::keeper::Keeper;
use crate::math::normalized_fraction;
use crate::tally::TallyOutcome;
use layer_store::{
    BlockInfo, Dispute, DisputeStateStore, StakeholderClass, StakeholderVoteCounts, Voter,
    WriteBatch,
};
use layer_types::{AccountAddress, Amount, BlockHeader, DisputeStatus, VoteChoice};

/// Team ballots carry one unit against a class total of one.
pub const TEAM_POWER: u128 = 1;

/// Raw power behind one ballot, per class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassPowers {
    pub users: u128,
    pub reporters: u128,
    pub tokenholders: u128,
    pub team: u128,
}

impl ClassPowers {
    pub fn get(&self, class: StakeholderClass) -> u128 {
        match class {
            StakeholderClass::Users => self.users,
            StakeholderClass::Reporters => self.reporters,
            StakeholderClass::Tokenholders => self.tokenholders,
            StakeholderClass::Team => self.team,
        }
    }

    pub fn is_zero(&self) -> bool {
        StakeholderClass::ALL.iter().all(|c| self.get(*c) == 0)
    }
}

/// Side effect on delegated-power bookkeeping that a reporter-class ballot
/// requires. Applied only after every check has passed.
#[derive(Clone, Debug, PartialEq, Eq)]
enum DelegationAdjustment {
    None,
    /// The reporter has not voted; remember delegated power already cast.
    RecordDelegated {
        reporter: AccountAddress,
        total: u128,
    },
    /// The reporter already voted with power that included this delegation.
    ReduceReporter {
        reporter: AccountAddress,
        amount: u128,
    },
}

/// Class denominator for normalizing raw power.
pub(crate) fn class_total(info: &BlockInfo, class: StakeholderClass, team_configured: bool) -> u128 {
    match class {
        StakeholderClass::Users => info.total_user_tips,
        StakeholderClass::Reporters => info.total_reporter_power,
        StakeholderClass::Tokenholders => info.total_token_supply.raw(),
        StakeholderClass::Team => {
            if team_configured {
                TEAM_POWER
            } else {
                0
            }
        }
    }
}

/// Sum of a ballot's normalized class fractions, in `POWER_REDUCTION` units.
pub(crate) fn normalized_voter_power(
    powers: &ClassPowers,
    info: &BlockInfo,
    team_configured: bool,
) -> Result<u128, DisputeError> {
    let mut total = 0u128;
    for class in StakeholderClass::ALL {
        let fraction = normalized_fraction(powers.get(class), class_total(info, class, team_configured))?;
        total = total
            .checked_add(fraction)
            .ok_or(DisputeError::Arithmetic("voter power overflow"))?;
    }
    Ok(total)
}

impl<S, L, R, O> Keeper<S, L, R, O>
where
    S: DisputeStateStore,
    L: LedgerAdapter,
    R: StakeRegistry,
    O: ReportingSubsystem,
{
    /// Cast a ballot on a dispute in `Voting`, then try to tally it.
    ///
    /// The ballot, any delegation bookkeeping and a decided tally are stored
    /// together. Returns the tally attempt's outcome; `StillVoting` is not an
    /// error.
    pub fn vote(
        &self,
        voter: &AccountAddress,
        dispute_id: u64,
        choice: VoteChoice,
        block: &BlockHeader,
    ) -> Result<TallyOutcome, DisputeError> {
        let mut dispute = self.store.get_dispute(dispute_id)?;
        if dispute.status != DisputeStatus::Voting {
            return Err(DisputeError::InvalidState(format!(
                "dispute {dispute_id} is {}, not voting",
                dispute.status
            )));
        }
        let mut vote = self.store.get_vote(dispute_id)?;
        if vote.vote_end.is_before(block.time) {
            return Err(DisputeError::InvalidState(format!(
                "voting on dispute {dispute_id} ended at {}",
                vote.vote_end
            )));
        }
        if self.store.has_voter(dispute_id, voter)? {
            return Err(DisputeError::AlreadyDone(format!(
                "{voter} already voted on dispute {dispute_id}"
            )));
        }

        let team = self.team_address()?;
        let team_configured = team.is_some();
        let info = self.block_info(&dispute.hash_id)?;
        let (powers, adjustment) = self.voter_powers(voter, &dispute, team.as_ref())?;
        if powers.is_zero() {
            return Err(DisputeError::ZeroVoterPower);
        }
        let voter_power = normalized_voter_power(&powers, &info, team_configured)?;

        let mut batch = WriteBatch::new();
        let mut counts = self.store.get_vote_counts(dispute_id)?;
        self.apply_delegation_adjustment(
            dispute_id,
            &adjustment,
            &info,
            team_configured,
            &mut counts,
            &mut batch,
        )?;
        for class in StakeholderClass::ALL {
            counts.class_mut(class).add(choice, powers.get(class));
        }
        let record = Voter {
            choice,
            voter_power,
            user_power: powers.users,
            reporter_power: powers.reporters,
            tokenholder_power: powers.tokenholders,
            team_power: powers.team,
            reward_claimed: false,
        };
        batch.put_voter(dispute_id, voter, &record);
        batch.put_vote_counts(dispute_id, &counts);
        vote.voters.push(voter.clone());

        let (outcome, scaled) =
            self.decide_round(&mut dispute, &mut vote, &counts, &info, team_configured, block)?;
        batch.put_vote(&vote);
        if let TallyOutcome::Decided { .. } = outcome {
            batch.put_dispute(&dispute);
        }
        self.commit(batch)?;

        tracing::debug!(
            dispute_id,
            voter = %voter,
            %choice,
            voter_power,
            users = powers.users,
            reporters = powers.reporters,
            tokenholders = powers.tokenholders,
            team = powers.team,
            "vote cast"
        );
        self.emit(DisputeEvent::Voted {
            dispute_id,
            voter: voter.clone(),
            choice,
            voter_power,
        });
        self.announce_tally(dispute_id, outcome, &scaled);
        Ok(outcome)
    }

    fn voter_powers(
        &self,
        voter: &AccountAddress,
        dispute: &Dispute,
        team: Option<&AccountAddress>,
    ) -> Result<(ClassPowers, DelegationAdjustment), DisputeError> {
        let team_power = match team {
            Some(team) if team == voter => TEAM_POWER,
            _ => 0,
        };
        let users = self.user_tips(voter, dispute.block_number)?;
        let (reporters, adjustment) = self.reporter_power(voter, dispute)?;
        let tokenholders = self.ledger.balance(voter)?.raw();
        Ok((
            ClassPowers {
                users,
                reporters,
                tokenholders,
                team: team_power,
            },
            adjustment,
        ))
    }

    fn user_tips(&self, voter: &AccountAddress, height: u64) -> Result<u128, DisputeError> {
        match self.oracle.tips_at_block_for_tipper(voter, height) {
            Ok(tips) => Ok(tips.raw()),
            Err(CollaboratorError::NotFound(_)) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Reporter-class power. A reporter votes with their stake at the
    /// dispute's block minus what their selectors already cast in this round;
    /// a selector votes with their delegation, which is then taken out of the
    /// reporter's ballot if the reporter voted first.
    fn reporter_power(
        &self,
        voter: &AccountAddress,
        dispute: &Dispute,
    ) -> Result<(u128, DelegationAdjustment), DisputeError> {
        let Some(delegation) = self.stake.delegation(voter)? else {
            return Ok((0, DelegationAdjustment::None));
        };
        let reporter = delegation.reporter;
        let id = dispute.dispute_id;
        let height = dispute.block_number;
        let delegated_voted = self
            .store
            .get_delegated_power_voted(&reporter, id)?
            .unwrap_or(0);

        if &reporter == voter {
            let tokens = self.stake.reporter_tokens_at_block(&reporter, height)?;
            return Ok((
                tokens.raw().saturating_sub(delegated_voted),
                DelegationAdjustment::None,
            ));
        }

        let amount = self.stake.delegator_tokens_at_block(voter, height)?.raw();
        if amount == 0 {
            return Ok((0, DelegationAdjustment::None));
        }
        let adjustment = if self.store.has_voter(id, &reporter)? {
            DelegationAdjustment::ReduceReporter { reporter, amount }
        } else {
            DelegationAdjustment::RecordDelegated {
                reporter,
                total: delegated_voted
                    .checked_add(amount)
                    .ok_or(DisputeError::Arithmetic("delegated power overflow"))?,
            }
        };
        Ok((amount, adjustment))
    }

    fn apply_delegation_adjustment(
        &self,
        dispute_id: u64,
        adjustment: &DelegationAdjustment,
        info: &BlockInfo,
        team_configured: bool,
        counts: &mut StakeholderVoteCounts,
        batch: &mut WriteBatch,
    ) -> Result<(), DisputeError> {
        match adjustment {
            DelegationAdjustment::None => {}
            DelegationAdjustment::RecordDelegated { reporter, total } => {
                batch.put_delegated_power_voted(reporter, dispute_id, *total);
            }
            DelegationAdjustment::ReduceReporter { reporter, amount } => {
                let mut ballot = self.store.get_voter(dispute_id, reporter)?;
                let reduced = (*amount).min(ballot.reporter_power);
                ballot.reporter_power -= reduced;
                counts
                    .class_mut(StakeholderClass::Reporters)
                    .sub(ballot.choice, reduced);
                let powers = ClassPowers {
                    users: ballot.user_power,
                    reporters: ballot.reporter_power,
                    tokenholders: ballot.tokenholder_power,
                    team: ballot.team_power,
                };
                ballot.voter_power = normalized_voter_power(&powers, info, team_configured)?;
                batch.put_voter(dispute_id, reporter, &ballot);
                tracing::debug!(
                    dispute_id,
                    reporter = %reporter,
                    reduced,
                    "selector vote taken out of reporter ballot"
                );
            }
        }
        Ok(())
    }

    /// Tips a voter had paid by the dispute's block.
    pub fn user_tips_for_dispute(
        &self,
        voter: &AccountAddress,
        dispute_id: u64,
    ) -> Result<Amount, DisputeError> {
        let dispute = self.store.get_dispute(dispute_id)?;
        Ok(Amount::new(self.user_tips(voter, dispute.block_number)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> BlockInfo {
        BlockInfo {
            total_reporter_power: 1_000,
            total_user_tips: 200,
            total_token_supply: Amount::new(10_000),
        }
    }

    #[test]
    fn team_class_only_counts_when_configured() {
        assert_eq!(class_total(&info(), StakeholderClass::Team, true), 1);
        assert_eq!(class_total(&info(), StakeholderClass::Team, false), 0);
    }

    #[test]
    fn voter_power_sums_class_fractions() {
        let powers = ClassPowers {
            users: 100,
            reporters: 250,
            tokenholders: 0,
            team: 1,
        };
        // 0.5 + 0.25 + 0 + 1.0
        assert_eq!(
            normalized_voter_power(&powers, &info(), true).unwrap(),
            1_750_000
        );
        assert_eq!(
            normalized_voter_power(&powers, &info(), false).unwrap(),
            750_000
        );
    }

    #[test]
    fn zero_powers_detected() {
        assert!(ClassPowers::default().is_zero());
        assert!(!ClassPowers {
            tokenholders: 1,
            ..Default::default()
        }
        .is_zero());
    }
}
