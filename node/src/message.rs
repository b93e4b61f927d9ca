//! Client messages delivered inside a block.
//!
//! Every message is a [`DisputeMsg`] serialized as JSON, one variant per
//! engine entry point. Decoding checks address prefixes, since serde builds
//! addresses without validating them.

use layer_types::{AccountAddress, Amount, DisputeCategory, MicroReport, VoteChoice};
use serde::{Deserialize, Serialize};

use crate::NodeError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeMsg {
    ProposeDispute(ProposeDisputeMsg),
    AddFeeToDispute(AddFeeMsg),
    Vote(VoteMsg),
    WithdrawFeeRefund(WithdrawFeeRefundMsg),
    ClaimReward(ClaimRewardMsg),
    AddEvidence(AddEvidenceMsg),
    UpdateTeam(UpdateTeamMsg),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposeDisputeMsg {
    pub creator: AccountAddress,
    pub report: MicroReport,
    pub category: DisputeCategory,
    pub fee: Amount,
    #[serde(default)]
    pub pay_from_bond: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddFeeMsg {
    pub payer: AccountAddress,
    pub dispute_id: u64,
    pub amount: Amount,
    #[serde(default)]
    pub pay_from_bond: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteMsg {
    pub voter: AccountAddress,
    pub dispute_id: u64,
    pub choice: VoteChoice,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawFeeRefundMsg {
    pub payer: AccountAddress,
    pub dispute_id: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRewardMsg {
    pub voter: AccountAddress,
    pub dispute_id: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddEvidenceMsg {
    pub caller: AccountAddress,
    pub dispute_id: u64,
    pub reports: Vec<MicroReport>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTeamMsg {
    pub current: AccountAddress,
    pub new_team: AccountAddress,
}

impl DisputeMsg {
    /// Decode and validate one JSON message.
    pub fn from_json(s: &str) -> Result<Self, NodeError> {
        let msg: Self =
            serde_json::from_str(s).map_err(|e| NodeError::InvalidMessage(e.to_string()))?;
        msg.validate()?;
        Ok(msg)
    }

    pub fn to_json(&self) -> Result<String, NodeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Short name used in spans and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProposeDispute(_) => "propose_dispute",
            Self::AddFeeToDispute(_) => "add_fee_to_dispute",
            Self::Vote(_) => "vote",
            Self::WithdrawFeeRefund(_) => "withdraw_fee_refund",
            Self::ClaimReward(_) => "claim_reward",
            Self::AddEvidence(_) => "add_evidence",
            Self::UpdateTeam(_) => "update_team",
        }
    }

    /// The account that signed the message.
    pub fn signer(&self) -> &AccountAddress {
        match self {
            Self::ProposeDispute(m) => &m.creator,
            Self::AddFeeToDispute(m) => &m.payer,
            Self::Vote(m) => &m.voter,
            Self::WithdrawFeeRefund(m) => &m.payer,
            Self::ClaimReward(m) => &m.voter,
            Self::AddEvidence(m) => &m.caller,
            Self::UpdateTeam(m) => &m.current,
        }
    }

    /// Check every address the message carries.
    pub fn validate(&self) -> Result<(), NodeError> {
        let mut addresses = vec![self.signer()];
        match self {
            Self::ProposeDispute(m) => addresses.push(&m.report.reporter),
            Self::AddEvidence(m) => addresses.extend(m.reports.iter().map(|r| &r.reporter)),
            Self::UpdateTeam(m) => addresses.push(&m.new_team),
            _ => {}
        }
        match addresses.into_iter().find(|a| !a.is_valid()) {
            Some(bad) => Err(NodeError::InvalidMessage(format!(
                "{}: bad address {bad:?}",
                self.kind()
            ))),
            None => Ok(()),
        }
    }
}
