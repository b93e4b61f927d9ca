//! Per-block hooks.
//!
//! `begin_block` moves disputes forward on time alone: expired prevotes fail,
//! closed ballots get tallied and decided rounds get executed. A failure on
//! one dispute is logged and does not stop the others.

use crate::collaborators::{LedgerAdapter, ReportingSubsystem, StakeRegistry};
use crate::error::DisputeError;
use crate::keeper::Keeper;
use crate::lifecycle::is_prevote_lapsed;
use crate::tally::TallyOutcome;
use layer_store::{DisputeStateStore, WriteBatch};
use layer_types::{BlockHeader, DisputeStatus};

/// What a `begin_block` pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockReport {
    pub expired: Vec<u64>,
    pub tallied: Vec<u64>,
    pub executed: Vec<u64>,
    /// Dispute id and error text for each dispute that could not progress.
    pub failures: Vec<(u64, String)>,
}

impl BlockReport {
    pub fn is_empty(&self) -> bool {
        self.expired.is_empty()
            && self.tallied.is_empty()
            && self.executed.is_empty()
            && self.failures.is_empty()
    }

    fn record_failure(&mut self, dispute_id: u64, stage: &'static str, err: &DisputeError) {
        tracing::warn!(dispute_id, stage, error = %err, "dispute skipped in begin_block");
        self.failures.push((dispute_id, err.to_string()));
    }
}

impl<S, L, R, O> Keeper<S, L, R, O>
where
    S: DisputeStateStore,
    L: LedgerAdapter,
    R: StakeRegistry,
    O: ReportingSubsystem,
{
    /// Advance every open dispute that the clock alone can move.
    ///
    /// Only index reads can fail the whole pass.
    pub fn begin_block(&self, block: &BlockHeader) -> Result<BlockReport, DisputeError> {
        let mut report = BlockReport::default();

        for id in self.store.open_dispute_ids()? {
            let dispute = match self.store.get_dispute(id) {
                Ok(d) => d,
                Err(e) => {
                    report.record_failure(id, "load", &DisputeError::from(e));
                    continue;
                }
            };
            if is_prevote_lapsed(&dispute, block) {
                match self.expire_dispute(dispute) {
                    Ok(()) => report.expired.push(id),
                    Err(e) => report.record_failure(id, "expire", &e),
                }
                continue;
            }
            if dispute.status == DisputeStatus::Voting {
                match self.tally_if_closed(id, block) {
                    Ok(true) => report.tallied.push(id),
                    Ok(false) => {}
                    Err(e) => report.record_failure(id, "tally", &e),
                }
            }
        }

        let mut due = self.store.pending_execution_ids()?;
        for id in self.store.open_dispute_ids()? {
            match self.is_lapsed_unresolved(id, block) {
                Ok(true) if !due.contains(&id) => due.push(id),
                Ok(_) => {}
                Err(e) => report.record_failure(id, "load", &e),
            }
        }
        due.sort_unstable();
        for id in due {
            match self.execute_vote(id, block) {
                Ok(()) => report.executed.push(id),
                Err(e) => report.record_failure(id, "execute", &e),
            }
        }

        if !report.is_empty() {
            tracing::debug!(
                height = block.height,
                expired = report.expired.len(),
                tallied = report.tallied.len(),
                executed = report.executed.len(),
                failures = report.failures.len(),
                "begin_block processed disputes"
            );
        }
        Ok(report)
    }

    /// Refresh the class denominators of disputes opened at this height so
    /// the snapshot reflects the block's final state.
    pub fn end_block(&self, block: &BlockHeader) -> Result<usize, DisputeError> {
        let mut batch = WriteBatch::new();
        let mut snapshot = None;
        for id in self.store.open_dispute_ids()? {
            let dispute = self.store.get_dispute(id)?;
            if dispute.block_number == block.height && dispute.start_block == block.height {
                let info = match snapshot {
                    Some(info) => info,
                    None => *snapshot.insert(self.block_snapshot()?),
                };
                batch.put_block_info(&dispute.hash_id, &info);
            }
        }
        let refreshed = batch.len();
        self.commit(batch)?;
        Ok(refreshed)
    }

    fn tally_if_closed(&self, dispute_id: u64, block: &BlockHeader) -> Result<bool, DisputeError> {
        let vote = self.store.get_vote(dispute_id)?;
        if !vote.vote_end.is_before(block.time) || vote.result.is_tallied() {
            return Ok(false);
        }
        Ok(matches!(
            self.tally_vote(dispute_id, block)?,
            TallyOutcome::Decided { .. }
        ))
    }

    fn is_lapsed_unresolved(&self, dispute_id: u64, block: &BlockHeader) -> Result<bool, DisputeError> {
        let dispute = self.store.get_dispute(dispute_id)?;
        if dispute.status != DisputeStatus::Unresolved || !dispute.end_time.is_before(block.time) {
            return Ok(false);
        }
        Ok(self.store.get_vote(dispute_id)?.result.is_tallied())
    }
}
