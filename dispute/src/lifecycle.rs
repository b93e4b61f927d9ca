//! Dispute creation, fee collection, round escalation and evidence.

use crate::collaborators::{CollaboratorError, LedgerAdapter, ReportingSubsystem, StakeRegistry};
use crate::error::DisputeError;
use crate::events::DisputeEvent;
use crate::keeper::Keeper;
use layer_store::{Dispute, DisputeStateStore, PayerInfo, Vote, WriteBatch};
use layer_types::{
    AccountAddress, Amount, BlockHeader, DisputeCategory, DisputeStatus, MicroReport,
};

impl<S, L, R, O> Keeper<S, L, R, O>
where
    S: DisputeStateStore,
    L: LedgerAdapter,
    R: StakeRegistry,
    O: ReportingSubsystem,
{
    /// Open a dispute against `report`, or escalate its lineage if the last
    /// round ended unresolved. Returns the id of the round that was created.
    pub fn propose_dispute(
        &self,
        creator: &AccountAddress,
        report: MicroReport,
        category: DisputeCategory,
        fee: Amount,
        pay_from_bond: bool,
        block: &BlockHeader,
    ) -> Result<u64, DisputeError> {
        if fee < self.params.min_dispute_fee {
            return Err(DisputeError::InvalidFee(format!(
                "fee {fee} is below the minimum {}",
                self.params.min_dispute_fee
            )));
        }
        let oldest = block.time.minus_secs(self.params.evidence_max_age_secs);
        if report.timestamp.is_before(oldest) {
            return Err(DisputeError::Validation(format!(
                "report at {} is older than the dispute window",
                report.timestamp
            )));
        }

        let hash_id = report
            .hash_id(category)
            .map_err(|e| DisputeError::Validation(e.to_string()))?;
        let existing = self
            .store
            .dispute_ids_by_reporter_key(&report.reporter_key(&hash_id))?;

        match existing.last() {
            Some(&last) => {
                let dispute = self.store.get_dispute(last)?;
                if dispute.status != DisputeStatus::Unresolved {
                    return Err(DisputeError::InvalidState(format!(
                        "dispute {} already exists for this report with status {}",
                        dispute.dispute_id, dispute.status
                    )));
                }
                self.add_dispute_round(dispute, creator, fee, pay_from_bond, block)
            }
            None => self.set_new_dispute(creator, report, category, fee, pay_from_bond, block),
        }
    }

    fn set_new_dispute(
        &self,
        creator: &AccountAddress,
        report: MicroReport,
        category: DisputeCategory,
        fee: Amount,
        pay_from_bond: bool,
        block: &BlockHeader,
    ) -> Result<u64, DisputeError> {
        let reporter = report.reporter.clone();
        if pay_from_bond && *creator == reporter {
            return Err(DisputeError::Validation(
                "disputed reporter cannot pay the fee from their own bond".into(),
            ));
        }
        let hash_id = report
            .hash_id(category)
            .map_err(|e| DisputeError::Validation(e.to_string()))?;

        let stake = self.stake.reporter_total_tokens(&reporter)?;
        let dispute_fee = stake
            .percent(category.slash_percent())
            .ok_or(DisputeError::Arithmetic("dispute fee overflow"))?;
        if dispute_fee.is_zero() {
            return Err(DisputeError::Validation(format!(
                "reporter {reporter} has no stake to dispute"
            )));
        }
        let paid = fee.min(dispute_fee);
        let dispute_id = self.store.next_dispute_id()?;

        let payer = PayerInfo {
            payer: creator.clone(),
            amount: paid,
            from_bond: pay_from_bond,
            block_number: block.height,
        };
        let mut dispute = Dispute {
            hash_id,
            dispute_id,
            category,
            dispute_fee,
            status: DisputeStatus::Prevote,
            start_time: block.time,
            end_time: block.time.plus_secs(self.params.prevote_duration_secs),
            start_block: block.height,
            round: 1,
            slash_amount: dispute_fee,
            burn_amount: dispute_fee
                .checked_div(20)
                .ok_or(DisputeError::Arithmetic("burn amount"))?,
            initial_evidence: report,
            additional_evidence: Vec::new(),
            fee_total: paid,
            fee_payers: vec![payer.clone()],
            prev_dispute_ids: vec![dispute_id],
            block_number: block.height,
            open: true,
            pending_execution: false,
            voter_reward: Amount::ZERO,
        };

        let slash = dispute.is_fee_met();
        let mut batch = WriteBatch::new();
        if slash {
            self.start_voting(&mut dispute, block, &mut batch);
        }
        batch.put_fee_payer(dispute_id, &payer);
        batch.put_dispute(&dispute);
        batch.set_next_dispute_id(dispute_id + 1);

        self.collect_dispute_fee(&payer, &dispute, slash, block)?;
        let committed = self.block_snapshot().and_then(|info| {
            batch.put_block_info(&dispute.hash_id, &info);
            self.commit(batch)
        });
        if let Err(e) = committed {
            self.return_collected(&payer, &dispute, slash);
            return Err(e);
        }
        self.flag_report(&dispute.initial_evidence);

        tracing::info!(
            dispute_id,
            reporter = %reporter,
            category = %category,
            fee = %paid,
            status = %dispute.status,
            "dispute proposed"
        );
        self.emit(DisputeEvent::Proposed {
            dispute_id,
            reporter,
            category,
            fee_paid: paid,
        });
        if dispute.status == DisputeStatus::Voting {
            self.emit(DisputeEvent::VotingStarted {
                dispute_id,
                slash_amount: dispute.slash_amount,
            });
        }
        Ok(dispute_id)
    }

    /// Escalate an unresolved dispute into a new round that votes immediately.
    ///
    /// The round fee equals the current burn amount and is added to it, so
    /// the burn doubles. It funds the larger burn and is not refundable.
    pub fn add_dispute_round(
        &self,
        dispute: Dispute,
        creator: &AccountAddress,
        fee: Amount,
        pay_from_bond: bool,
        block: &BlockHeader,
    ) -> Result<u64, DisputeError> {
        if dispute.status != DisputeStatus::Unresolved {
            return Err(DisputeError::InvalidState(format!(
                "can't start a new round for dispute {}; status {}",
                dispute.dispute_id, dispute.status
            )));
        }
        if dispute.end_time.is_before(block.time) {
            return Err(DisputeError::InvalidState(format!(
                "dispute {} expired at {}, can't start a new round",
                dispute.dispute_id, dispute.end_time
            )));
        }
        if dispute.burn_amount >= dispute.slash_amount {
            return Err(DisputeError::InvalidState(format!(
                "dispute {} has exhausted its rounds",
                dispute.dispute_id
            )));
        }
        let round_fee = dispute.burn_amount;
        if fee < round_fee {
            return Err(DisputeError::InvalidFee(format!(
                "round fee is {round_fee}, got {fee}"
            )));
        }
        if pay_from_bond && creator == dispute.reporter() {
            return Err(DisputeError::Validation(
                "disputed reporter cannot pay the fee from their own bond".into(),
            ));
        }
        let burn_amount = dispute
            .burn_amount
            .checked_add(round_fee)
            .ok_or(DisputeError::Arithmetic("burn amount overflow"))?;
        let new_id = self.store.next_dispute_id()?;
        let payment = PayerInfo {
            payer: creator.clone(),
            amount: round_fee,
            from_bond: pay_from_bond,
            block_number: block.height,
        };

        let mut previous = dispute.clone();
        previous.open = false;
        previous.pending_execution = false;

        let mut next = dispute;
        next.dispute_id = new_id;
        next.round += 1;
        next.burn_amount = burn_amount;
        next.start_time = block.time;
        next.start_block = block.height;
        next.fee_payers = vec![payment.clone()];
        next.prev_dispute_ids.push(new_id);
        next.open = true;
        next.pending_execution = false;
        next.voter_reward = Amount::ZERO;

        let mut batch = WriteBatch::new();
        self.start_voting(&mut next, block, &mut batch);
        batch.put_dispute(&previous);
        batch.put_dispute(&next);
        batch.set_next_dispute_id(new_id + 1);

        self.collect_dispute_fee(&payment, &next, false, block)?;
        if let Err(e) = self.commit(batch) {
            self.return_collected(&payment, &next, false);
            return Err(e);
        }

        tracing::info!(
            dispute_id = new_id,
            previous_id = previous.dispute_id,
            round = next.round,
            burn_amount = %next.burn_amount,
            "dispute round added"
        );
        self.emit(DisputeEvent::RoundAdded {
            dispute_id: new_id,
            previous_id: previous.dispute_id,
            round: next.round,
            burn_amount: next.burn_amount,
        });
        Ok(new_id)
    }

    /// Contribute towards a prevote dispute's fee. Overpayment is capped at
    /// what is still needed; meeting the fee starts the vote.
    pub fn add_fee_to_dispute(
        &self,
        payer: &AccountAddress,
        dispute_id: u64,
        amount: Amount,
        pay_from_bond: bool,
        block: &BlockHeader,
    ) -> Result<(), DisputeError> {
        let mut dispute = self.store.get_dispute(dispute_id)?;
        if dispute.is_fee_met() {
            return Err(DisputeError::AlreadyDone(format!(
                "dispute {dispute_id} fee already met"
            )));
        }
        if dispute.status != DisputeStatus::Prevote {
            return Err(DisputeError::InvalidState(format!(
                "dispute {dispute_id} is {}, not collecting fees",
                dispute.status
            )));
        }
        if dispute.end_time.is_before(block.time) {
            return Err(DisputeError::InvalidState(format!(
                "dispute {dispute_id} prevote window closed at {}",
                dispute.end_time
            )));
        }
        let remaining = dispute.fee_remaining();
        if amount.is_zero() || amount < self.params.min_dispute_fee.min(remaining) {
            return Err(DisputeError::InvalidFee(format!(
                "fee {amount} is below the minimum {}",
                self.params.min_dispute_fee.min(remaining)
            )));
        }
        if pay_from_bond && payer == dispute.reporter() {
            return Err(DisputeError::Validation(
                "disputed reporter cannot pay the fee from their own bond".into(),
            ));
        }
        let root_id = dispute.root_id();
        let previous = match self.store.get_fee_payer(root_id, payer) {
            Ok(info) => Some(info),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        };
        if let Some(info) = &previous {
            if info.from_bond != pay_from_bond {
                return Err(DisputeError::Validation(format!(
                    "{payer} already paid {} bond; payment sources cannot be mixed",
                    if info.from_bond { "from" } else { "without" }
                )));
            }
        }
        let paid = amount.min(remaining);
        let payment = PayerInfo {
            payer: payer.clone(),
            amount: paid,
            from_bond: pay_from_bond,
            block_number: block.height,
        };

        let record = PayerInfo {
            payer: payer.clone(),
            amount: previous
                .map(|p| p.amount)
                .unwrap_or(Amount::ZERO)
                .checked_add(paid)
                .ok_or(DisputeError::Arithmetic("payer total overflow"))?,
            from_bond: pay_from_bond,
            block_number: block.height,
        };
        dispute.fee_total = dispute
            .fee_total
            .checked_add(paid)
            .ok_or(DisputeError::Arithmetic("fee total overflow"))?;
        dispute.fee_payers.push(payment.clone());

        let started = dispute.is_fee_met();
        let mut batch = WriteBatch::new();
        if started {
            self.start_voting(&mut dispute, block, &mut batch);
        }
        batch.put_fee_payer(root_id, &record);
        batch.put_dispute(&dispute);

        self.collect_dispute_fee(&payment, &dispute, started, block)?;
        if let Err(e) = self.commit(batch) {
            self.return_collected(&payment, &dispute, started);
            return Err(e);
        }

        tracing::debug!(dispute_id, payer = %payer, amount = %paid, "fee added to dispute");
        self.emit(DisputeEvent::FeeAdded {
            dispute_id,
            payer: payer.clone(),
            amount: paid,
        });
        if started {
            tracing::info!(dispute_id, slash_amount = %dispute.slash_amount, "dispute fee met, voting started");
            self.emit(DisputeEvent::VotingStarted {
                dispute_id,
                slash_amount: dispute.slash_amount,
            });
        }
        Ok(())
    }

    /// Move `payment` into escrow and, when `slash` is set, escrow the
    /// reporter's slash. Nothing stays in escrow if this returns an error.
    ///
    /// The reporter's stake is checked before any tokens move, so a fee is
    /// never taken for a slash that cannot be escrowed.
    fn collect_dispute_fee(
        &self,
        payment: &PayerInfo,
        dispute: &Dispute,
        slash: bool,
        block: &BlockHeader,
    ) -> Result<(), DisputeError> {
        if slash {
            self.ensure_slashable(dispute)?;
        }
        self.pay_dispute_fee(
            &payment.payer,
            payment.amount,
            payment.from_bond,
            &dispute.hash_id,
        )?;
        if slash {
            if let Err(e) = self.slash_and_jail_reporter(dispute, block) {
                self.return_dispute_fee(payment, &dispute.hash_id);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Undo [`Self::collect_dispute_fee`] after a failed commit.
    fn return_collected(&self, payment: &PayerInfo, dispute: &Dispute, slashed: bool) {
        tracing::warn!(
            dispute_id = dispute.dispute_id,
            payer = %payment.payer,
            "dispute write failed, returning collected tokens"
        );
        if slashed {
            self.return_slash(dispute);
        }
        self.return_dispute_fee(payment, &dispute.hash_id);
    }

    fn ensure_slashable(&self, dispute: &Dispute) -> Result<(), DisputeError> {
        let reporter = dispute.reporter();
        let staked = self.stake.reporter_total_tokens(reporter)?;
        if staked < dispute.slash_amount {
            return Err(DisputeError::InsufficientFunds(format!(
                "reporter {reporter} has {staked} staked, dispute {} slashes {}",
                dispute.dispute_id, dispute.slash_amount
            )));
        }
        Ok(())
    }

    /// Escrow the slash amount from the reporter's stake and apply the
    /// category's jail policy.
    pub(crate) fn slash_and_jail_reporter(
        &self,
        dispute: &Dispute,
        block: &BlockHeader,
    ) -> Result<(), DisputeError> {
        let reporter = dispute.reporter();
        self.stake
            .escrow_reporter_stake(reporter, dispute.slash_amount, &dispute.hash_id)?;
        let policy = dispute.category.jail_policy(self.params.minor_jail_secs);
        if let Err(e) = self.stake.jail_reporter(reporter, policy, block.time) {
            self.return_slash(dispute);
            return Err(e.into());
        }
        tracing::debug!(
            dispute_id = dispute.dispute_id,
            reporter = %reporter,
            slash = %dispute.slash_amount,
            ?policy,
            "reporter slashed"
        );
        Ok(())
    }

    /// Move a dispute into `Voting` and stage its ballot.
    pub(crate) fn start_voting(
        &self,
        dispute: &mut Dispute,
        block: &BlockHeader,
        batch: &mut WriteBatch,
    ) {
        let vote_end = block.time.plus_secs(self.params.voting_duration_secs);
        dispute.status = DisputeStatus::Voting;
        dispute.end_time = vote_end;
        batch.put_vote(&Vote::new(dispute.dispute_id, block.time, vote_end));
    }

    /// Attach more reports by the disputed reporter to an open dispute.
    pub fn add_evidence(
        &self,
        caller: &AccountAddress,
        dispute_id: u64,
        reports: Vec<MicroReport>,
        block: &BlockHeader,
    ) -> Result<(), DisputeError> {
        let mut dispute = self.store.get_dispute(dispute_id)?;
        if !dispute.open {
            return Err(DisputeError::InvalidState(format!(
                "dispute {dispute_id} is not open"
            )));
        }
        if reports.is_empty() {
            return Err(DisputeError::Validation("no evidence supplied".into()));
        }
        let oldest = block.time.minus_secs(self.params.evidence_max_age_secs);
        if let Some(stranger) = reports.iter().find(|r| &r.reporter != dispute.reporter()) {
            return Err(DisputeError::Validation(format!(
                "evidence by {} does not match disputed reporter {}",
                stranger.reporter,
                dispute.reporter()
            )));
        }
        if reports.iter().any(|r| r.timestamp.is_before(oldest)) {
            return Err(DisputeError::Validation(
                "additional evidence must be younger than the dispute window".into(),
            ));
        }
        if dispute.initial_evidence.timestamp.is_before(oldest) {
            return Err(DisputeError::Validation(
                "disputed report is older than the dispute window".into(),
            ));
        }

        let count = reports.len();
        dispute.additional_evidence.extend(reports.iter().cloned());
        self.store.put_dispute(&dispute)?;
        for report in &reports {
            self.flag_report(report);
        }

        tracing::debug!(dispute_id, caller = %caller, count, "evidence added");
        self.emit(DisputeEvent::EvidenceAdded {
            dispute_id,
            reports: count,
        });
        Ok(())
    }

    /// Mark prevote disputes past their deadline as `Failed`.
    ///
    /// Five percent of what was collected is burned now; payers withdraw the
    /// rest. Returns the ids that expired.
    pub fn expire_prevote_disputes(&self, block: &BlockHeader) -> Result<Vec<u64>, DisputeError> {
        let mut expired = Vec::new();
        for id in self.store.open_dispute_ids()? {
            let dispute = self.store.get_dispute(id)?;
            if is_prevote_lapsed(&dispute, block) {
                self.expire_dispute(dispute)?;
                expired.push(id);
            }
        }
        Ok(expired)
    }

    /// The `Failed` status is stored before the burn so a retry can never
    /// burn twice.
    pub(crate) fn expire_dispute(&self, mut dispute: Dispute) -> Result<(), DisputeError> {
        let burn = dispute
            .fee_total
            .checked_div(20)
            .ok_or(DisputeError::Arithmetic("expiry burn"))?;
        dispute.status = DisputeStatus::Failed;
        dispute.open = false;
        dispute.pending_execution = false;
        self.store.put_dispute(&dispute)?;
        self.burn(burn)?;

        tracing::info!(
            dispute_id = dispute.dispute_id,
            fee_total = %dispute.fee_total,
            "prevote dispute expired"
        );
        self.emit(DisputeEvent::Expired {
            dispute_id: dispute.dispute_id,
        });
        Ok(())
    }

    /// Runs after the dispute is stored; a failure is logged, not returned.
    fn flag_report(&self, report: &MicroReport) {
        match self.oracle.flag_aggregate_report(report) {
            Ok(()) | Err(CollaboratorError::NotFound(_)) => {}
            Err(e) => tracing::warn!(
                reporter = %report.reporter,
                timestamp = %report.timestamp,
                error = %e,
                "aggregate report could not be flagged"
            ),
        }
    }
}

pub(crate) fn is_prevote_lapsed(dispute: &Dispute, block: &BlockHeader) -> bool {
    dispute.status == DisputeStatus::Prevote && dispute.end_time.is_before(block.time)
}
