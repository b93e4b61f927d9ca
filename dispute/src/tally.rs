//! Tallying: per-class normalization and the round decision.

use crate::collaborators::{LedgerAdapter, ReportingSubsystem, StakeRegistry};
use crate::error::DisputeError;
use crate::events::DisputeEvent;
use crate::keeper::Keeper;
use crate::math::normalized_fraction;
use crate::vote::class_total;
use layer_store::{
    BlockInfo, Dispute, DisputeStateStore, StakeholderClass, StakeholderVoteCounts, Tally, Vote,
    WriteBatch,
};
use layer_types::{BlockHeader, DisputeStatus, VoteChoice, VoteResult, POWER_REDUCTION};

/// Result of a tally attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TallyOutcome {
    /// No majority yet and the ballot is still open.
    StillVoting,
    Decided {
        result: VoteResult,
        status: DisputeStatus,
    },
}

/// Average of the per-class normalized fractions for each option, in
/// `POWER_REDUCTION` units. Classes with a zero denominator do not take part.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScaledTally {
    pub support: u128,
    pub against: u128,
    pub invalid: u128,
    pub active_classes: u32,
}

impl ScaledTally {
    pub fn compute(
        counts: &StakeholderVoteCounts,
        info: &BlockInfo,
        team_configured: bool,
    ) -> Result<Self, DisputeError> {
        let mut sums = [0u128; 3];
        let mut active = 0u32;
        for class in StakeholderClass::ALL {
            let total = class_total(info, class, team_configured);
            if total == 0 {
                continue;
            }
            active += 1;
            for (slot, choice) in sums.iter_mut().zip(VoteChoice::ALL) {
                *slot += normalized_fraction(counts.class(class).get(choice), total)?;
            }
        }
        if active == 0 {
            return Ok(Self::default());
        }
        let n = u128::from(active);
        Ok(Self {
            support: sums[0] / n,
            against: sums[1] / n,
            invalid: sums[2] / n,
            active_classes: active,
        })
    }

    pub fn get(&self, choice: VoteChoice) -> u128 {
        match choice {
            VoteChoice::Support => self.support,
            VoteChoice::Against => self.against,
            VoteChoice::Invalid => self.invalid,
        }
    }

    /// The option holding more than half of the scaled weight, if any.
    pub fn majority(&self) -> Option<VoteChoice> {
        VoteChoice::ALL
            .into_iter()
            .find(|c| self.get(*c) * 2 > POWER_REDUCTION)
    }

    /// The single option strictly ahead of both others, if any.
    pub fn plurality(&self) -> Option<VoteChoice> {
        VoteChoice::ALL.into_iter().find(|c| {
            let mine = self.get(*c);
            VoteChoice::ALL
                .into_iter()
                .filter(|o| o != c)
                .all(|o| mine > self.get(o))
        })
    }

    fn as_tally(&self) -> Tally {
        Tally {
            support: self.support,
            against: self.against,
            invalid: self.invalid,
        }
    }
}

impl<S, L, R, O> Keeper<S, L, R, O>
where
    S: DisputeStateStore,
    L: LedgerAdapter,
    R: StakeRegistry,
    O: ReportingSubsystem,
{
    /// Decide a round if it can be decided.
    ///
    /// A majority above one half resolves the dispute at once. Otherwise,
    /// once the ballot has closed, the leading option is recorded as a
    /// no-quorum result and the dispute becomes `Unresolved` with a grace
    /// period for escalation, or `Resolved` if no further round is possible.
    pub fn tally_vote(&self, dispute_id: u64, block: &BlockHeader) -> Result<TallyOutcome, DisputeError> {
        let mut dispute = self.store.get_dispute(dispute_id)?;
        if dispute.status != DisputeStatus::Voting {
            return Err(DisputeError::InvalidState(format!(
                "dispute {dispute_id} is {}, not voting",
                dispute.status
            )));
        }
        let mut vote = self.store.get_vote(dispute_id)?;
        if vote.result.is_tallied() {
            return Err(DisputeError::AlreadyDone(format!(
                "vote {dispute_id} already tallied as {}",
                vote.result
            )));
        }

        let info = self.block_info(&dispute.hash_id)?;
        let counts = self.store.get_vote_counts(dispute_id)?;
        let team_configured = self.team_address()?.is_some();
        let (outcome, scaled) =
            self.decide_round(&mut dispute, &mut vote, &counts, &info, team_configured, block)?;
        if let TallyOutcome::Decided { .. } = outcome {
            let mut batch = WriteBatch::new();
            batch.put_vote(&vote);
            batch.put_dispute(&dispute);
            self.commit(batch)?;
            self.announce_tally(dispute_id, outcome, &scaled);
        }
        Ok(outcome)
    }

    /// Apply the round decision to `dispute` and `vote` in memory. The caller
    /// stages both when the outcome is `Decided`.
    pub(crate) fn decide_round(
        &self,
        dispute: &mut Dispute,
        vote: &mut Vote,
        counts: &StakeholderVoteCounts,
        info: &BlockInfo,
        team_configured: bool,
        block: &BlockHeader,
    ) -> Result<(TallyOutcome, ScaledTally), DisputeError> {
        let scaled = ScaledTally::compute(counts, info, team_configured)?;

        let (result, status) = if let Some(choice) = scaled.majority() {
            (VoteResult::majority(choice), DisputeStatus::Resolved)
        } else if vote.vote_end.is_before(block.time) {
            let choice = if vote.voters.is_empty() {
                VoteChoice::Invalid
            } else {
                scaled.plurality().unwrap_or(VoteChoice::Invalid)
            };
            let status = if dispute.burn_amount >= dispute.slash_amount {
                DisputeStatus::Resolved
            } else {
                DisputeStatus::Unresolved
            };
            (VoteResult::no_quorum(choice), status)
        } else {
            tracing::debug!(
                dispute_id = dispute.dispute_id,
                support = scaled.support,
                against = scaled.against,
                invalid = scaled.invalid,
                "no majority yet, still voting"
            );
            return Ok((TallyOutcome::StillVoting, scaled));
        };

        vote.result = result;
        vote.tally = Some(scaled.as_tally());
        dispute.status = status;
        match status {
            DisputeStatus::Resolved => dispute.pending_execution = true,
            _ => {
                dispute.end_time = vote
                    .vote_end
                    .plus_secs(self.params.unresolved_extension_secs)
            }
        }
        Ok((TallyOutcome::Decided { result, status }, scaled))
    }

    /// Log and emit a decided round once it is stored.
    pub(crate) fn announce_tally(&self, dispute_id: u64, outcome: TallyOutcome, scaled: &ScaledTally) {
        let TallyOutcome::Decided { result, status } = outcome else {
            return;
        };
        tracing::info!(
            dispute_id,
            %result,
            %status,
            support = scaled.support,
            against = scaled.against,
            invalid = scaled.invalid,
            classes = scaled.active_classes,
            "vote tallied"
        );
        self.emit(DisputeEvent::Tallied {
            dispute_id,
            result,
            status,
        });
    }

    /// Vote counts summed over every round of the lineage up to `dispute_id`.
    pub fn lineage_vote_counts(&self, dispute_id: u64) -> Result<StakeholderVoteCounts, DisputeError> {
        let dispute = self.store.get_dispute(dispute_id)?;
        let mut total = StakeholderVoteCounts::default();
        for round in dispute.lineage() {
            total.merge(&self.store.get_vote_counts(round)?);
        }
        Ok(total)
    }

    /// Raw power cast across all classes and all rounds of the lineage.
    pub fn sum_of_all_group_votes_all_rounds(&self, dispute_id: u64) -> Result<u128, DisputeError> {
        Ok(self.lineage_vote_counts(dispute_id)?.total())
    }
}
