//! Block processing: begin_block, then each message in order, then end_block.
//!
//! A message the engine rejects fails on its own and the rest of the block
//! still runs. Each message's store writes land in one commit, so a rejected
//! message stores nothing, and fees it collected before the failure are handed
//! back. A reporter jailed by a slash whose commit then failed stays jailed.
//! Payouts move after their commit, so a payout that fails is reported while
//! the claim it settles stays recorded. Only store failures in the block hooks
//! abort a block.

use std::time::Instant;

use layer_dispute::{
    BlockReport, DisputeError, Keeper, LedgerAdapter, ReportingSubsystem, StakeRegistry,
    TallyOutcome,
};
use layer_store::DisputeStateStore;
use layer_types::{Amount, BlockHeader};
use serde::{Deserialize, Serialize};

use crate::message::DisputeMsg;
use crate::metrics::NodeMetrics;
use crate::tracing_spans;
use crate::NodeError;

/// A block as the host hands it over: a header and the dispute messages it
/// carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    #[serde(default)]
    pub msgs: Vec<DisputeMsg>,
}

impl Block {
    pub fn new(header: BlockHeader, msgs: Vec<DisputeMsg>) -> Self {
        Self { header, msgs }
    }

    pub fn empty(header: BlockHeader) -> Self {
        Self::new(header, Vec::new())
    }
}

/// What a delivered message did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MsgOutcome {
    /// A first round or an escalation round was created.
    Proposed { dispute_id: u64 },
    FeeAdded,
    Voted(TallyOutcome),
    FeeRefunded(Amount),
    RewardClaimed(Amount),
    EvidenceAdded,
    TeamUpdated { moved_ballots: usize },
}

#[derive(Debug)]
pub struct BlockResult {
    pub header: BlockHeader,
    pub begin: BlockReport,
    /// One entry per message, in block order.
    pub msgs: Vec<Result<MsgOutcome, DisputeError>>,
    /// Disputes whose snapshot was refreshed by `end_block`.
    pub refreshed: usize,
}

impl BlockResult {
    pub fn failed_msgs(&self) -> usize {
        self.msgs.iter().filter(|r| r.is_err()).count()
    }
}

/// Route one message to its keeper operation.
pub fn deliver_msg<S, L, R, O>(
    keeper: &Keeper<S, L, R, O>,
    msg: &DisputeMsg,
    header: &BlockHeader,
) -> Result<MsgOutcome, DisputeError>
where
    S: DisputeStateStore,
    L: LedgerAdapter,
    R: StakeRegistry,
    O: ReportingSubsystem,
{
    match msg {
        DisputeMsg::ProposeDispute(m) => keeper
            .propose_dispute(
                &m.creator,
                m.report.clone(),
                m.category,
                m.fee,
                m.pay_from_bond,
                header,
            )
            .map(|dispute_id| MsgOutcome::Proposed { dispute_id }),
        DisputeMsg::AddFeeToDispute(m) => keeper
            .add_fee_to_dispute(&m.payer, m.dispute_id, m.amount, m.pay_from_bond, header)
            .map(|()| MsgOutcome::FeeAdded),
        DisputeMsg::Vote(m) => keeper
            .vote(&m.voter, m.dispute_id, m.choice, header)
            .map(MsgOutcome::Voted),
        DisputeMsg::WithdrawFeeRefund(m) => keeper
            .withdraw_fee_refund(&m.payer, m.dispute_id)
            .map(MsgOutcome::FeeRefunded),
        DisputeMsg::ClaimReward(m) => keeper
            .claim_reward(&m.voter, m.dispute_id)
            .map(MsgOutcome::RewardClaimed),
        DisputeMsg::AddEvidence(m) => keeper
            .add_evidence(&m.caller, m.dispute_id, m.reports.clone(), header)
            .map(|()| MsgOutcome::EvidenceAdded),
        DisputeMsg::UpdateTeam(m) => keeper
            .update_team(&m.current, &m.new_team)
            .map(|moved_ballots| MsgOutcome::TeamUpdated { moved_ballots }),
    }
}

/// Drives blocks through the keeper in height order.
#[derive(Debug, Default)]
pub struct BlockProcessor {
    last: Option<BlockHeader>,
}

impl BlockProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue after `last`, e.g. when a host restarts on an existing store.
    pub fn resume(last: BlockHeader) -> Self {
        Self { last: Some(last) }
    }

    pub fn last_header(&self) -> Option<BlockHeader> {
        self.last
    }

    pub fn process<S, L, R, O>(
        &mut self,
        keeper: &Keeper<S, L, R, O>,
        block: &Block,
        metrics: Option<&NodeMetrics>,
    ) -> Result<BlockResult, NodeError>
    where
        S: DisputeStateStore,
        L: LedgerAdapter,
        R: StakeRegistry,
        O: ReportingSubsystem,
    {
        let header = block.header;
        self.check_order(&header)?;
        let started = Instant::now();

        let begin = {
            let _span = tracing_spans::begin_block_span(header.height).entered();
            keeper.begin_block(&header)?
        };

        let mut results = Vec::with_capacity(block.msgs.len());
        for (index, msg) in block.msgs.iter().enumerate() {
            let _span = tracing_spans::deliver_msg_span(header.height, index, msg.kind()).entered();
            let result = deliver_msg(keeper, msg, &header);
            if let Err(e) = &result {
                tracing::info!(signer = %msg.signer(), error = %e, "message rejected");
            }
            results.push(result);
        }

        let refreshed = {
            let _span = tracing_spans::end_block_span(header.height).entered();
            keeper.end_block(&header)?
        };
        self.last = Some(header);

        let result = BlockResult {
            header,
            begin,
            msgs: results,
            refreshed,
        };
        if let Some(metrics) = metrics {
            metrics.msgs_failed.inc_by(result.failed_msgs() as u64);
            metrics.hook_failures.inc_by(result.begin.failures.len() as u64);
            metrics.open_disputes.set(keeper.open_disputes()?.len() as i64);
            metrics.block_height.set(header.height as i64);
            metrics
                .block_process_time_ms
                .observe(started.elapsed().as_secs_f64() * 1_000.0);
        }
        tracing::debug!(
            height = header.height,
            msgs = result.msgs.len(),
            failed = result.failed_msgs(),
            expired = result.begin.expired.len(),
            executed = result.begin.executed.len(),
            "block processed"
        );
        Ok(result)
    }

    fn check_order(&self, header: &BlockHeader) -> Result<(), NodeError> {
        match self.last {
            Some(last) if header.height <= last.height => Err(NodeError::InvalidBlock(format!(
                "height {} does not follow {}",
                header.height, last.height
            ))),
            Some(last) if header.time.is_before(last.time) => Err(NodeError::InvalidBlock(
                format!("time {} is before {}", header.time, last.time),
            )),
            _ => Ok(()),
        }
    }
}
