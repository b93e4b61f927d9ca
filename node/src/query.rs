//! JSON query surface over the keeper's read-only views.

use layer_dispute::{DisputeError, Keeper, LedgerAdapter, ReportingSubsystem, StakeRegistry};
use layer_store::DisputeStateStore;
use layer_types::{AccountAddress, Amount, DisputeStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tracing_spans;
use crate::NodeError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeQuery {
    Dispute { dispute_id: u64 },
    OpenDisputes,
    Disputes {
        #[serde(default)]
        status: Option<DisputeStatus>,
    },
    VoteInfo { dispute_id: u64 },
    VoterInfo { dispute_id: u64, voter: AccountAddress },
    TeamVote { dispute_id: u64 },
    VoteCounts { dispute_id: u64 },
    LineageVoteCounts { dispute_id: u64 },
    SumOfAllGroupVotesAllRounds { dispute_id: u64 },
    CalculateReward { dispute_id: u64, voter: AccountAddress },
    UserTipsForDispute { dispute_id: u64, voter: AccountAddress },
    FeePayer { dispute_id: u64, payer: AccountAddress },
    FeePayers { dispute_id: u64 },
    DisputeBlockInfo { dispute_id: u64 },
    Dust,
    Team,
    Params,
}

impl DisputeQuery {
    pub fn from_json(s: &str) -> Result<Self, NodeError> {
        serde_json::from_str(s).map_err(|e| NodeError::InvalidQuery(e.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Dispute { .. } => "dispute",
            Self::OpenDisputes => "open_disputes",
            Self::Disputes { .. } => "disputes",
            Self::VoteInfo { .. } => "vote_info",
            Self::VoterInfo { .. } => "voter_info",
            Self::TeamVote { .. } => "team_vote",
            Self::VoteCounts { .. } => "vote_counts",
            Self::LineageVoteCounts { .. } => "lineage_vote_counts",
            Self::SumOfAllGroupVotesAllRounds { .. } => "sum_of_all_group_votes_all_rounds",
            Self::CalculateReward { .. } => "calculate_reward",
            Self::UserTipsForDispute { .. } => "user_tips_for_dispute",
            Self::FeePayer { .. } => "fee_payer",
            Self::FeePayers { .. } => "fee_payers",
            Self::DisputeBlockInfo { .. } => "dispute_block_info",
            Self::Dust => "dust",
            Self::Team => "team",
            Self::Params => "params",
        }
    }
}

/// Answer one query. Amounts above `u64::MAX` fail to encode.
pub fn run_query<S, L, R, O>(
    keeper: &Keeper<S, L, R, O>,
    query: &DisputeQuery,
) -> Result<Value, NodeError>
where
    S: DisputeStateStore,
    L: LedgerAdapter,
    R: StakeRegistry,
    O: ReportingSubsystem,
{
    let _span = tracing_spans::query_span(query.name()).entered();
    match query {
        DisputeQuery::Dispute { dispute_id } => to_json(keeper.dispute(*dispute_id)?),
        DisputeQuery::OpenDisputes => to_json(keeper.open_disputes()?),
        DisputeQuery::Disputes { status } => to_json(keeper.disputes(*status)?),
        DisputeQuery::VoteInfo { dispute_id } => to_json(keeper.vote_info(*dispute_id)?),
        DisputeQuery::VoterInfo { dispute_id, voter } => {
            to_json(keeper.voter_info(*dispute_id, voter)?)
        }
        DisputeQuery::TeamVote { dispute_id } => to_json(keeper.team_vote(*dispute_id)?),
        DisputeQuery::VoteCounts { dispute_id } => to_json(keeper.vote_counts(*dispute_id)?),
        DisputeQuery::LineageVoteCounts { dispute_id } => {
            to_json(keeper.lineage_vote_counts(*dispute_id)?)
        }
        DisputeQuery::SumOfAllGroupVotesAllRounds { dispute_id } => {
            to_json(keeper.sum_of_all_group_votes_all_rounds(*dispute_id)?)
        }
        DisputeQuery::CalculateReward { dispute_id, voter } => {
            let share = keeper.calculate_reward(voter, *dispute_id)?;
            to_json(RewardView {
                amount: share.amount,
                dust: share.dust,
            })
        }
        DisputeQuery::UserTipsForDispute { dispute_id, voter } => {
            to_json(keeper.user_tips_for_dispute(voter, *dispute_id)?)
        }
        DisputeQuery::FeePayer { dispute_id, payer } => {
            to_json(keeper.fee_payer(*dispute_id, payer)?)
        }
        DisputeQuery::FeePayers { dispute_id } => to_json(keeper.fee_payers(*dispute_id)?),
        DisputeQuery::DisputeBlockInfo { dispute_id } => {
            to_json(keeper.dispute_block_info(*dispute_id)?)
        }
        DisputeQuery::Dust => to_json(keeper.dust()?),
        DisputeQuery::Team => to_json(keeper.team()?),
        DisputeQuery::Params => to_json(keeper.dispute_params()),
    }
}

#[derive(Serialize)]
struct RewardView {
    amount: Amount,
    /// Millionths of a loya left over after rounding down.
    dust: u128,
}

fn to_json<T: Serialize>(value: T) -> Result<Value, NodeError> {
    Ok(serde_json::to_value(value)?)
}

/// Whether a query failed because the record does not exist.
pub fn is_not_found(err: &NodeError) -> bool {
    matches!(err, NodeError::Dispute(DisputeError::NotFound { .. }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_decode_from_json() {
        assert_eq!(
            DisputeQuery::from_json(r#""open_disputes""#).unwrap(),
            DisputeQuery::OpenDisputes
        );
        assert_eq!(
            DisputeQuery::from_json(r#"{"disputes":{"status":"voting"}}"#).unwrap(),
            DisputeQuery::Disputes {
                status: Some(DisputeStatus::Voting)
            }
        );
        assert_eq!(
            DisputeQuery::from_json(r#"{"disputes":{}}"#).unwrap(),
            DisputeQuery::Disputes { status: None }
        );
        assert!(matches!(
            DisputeQuery::from_json(r#"{"dispute":{}}"#),
            Err(NodeError::InvalidQuery(_))
        ));
    }

    #[test]
    fn names_match_serde_tags() {
        let q = DisputeQuery::SumOfAllGroupVotesAllRounds { dispute_id: 2 };
        let json = serde_json::to_string(&q).unwrap();
        assert!(json.starts_with(&format!("{{\"{}\"", q.name())));
    }
}
