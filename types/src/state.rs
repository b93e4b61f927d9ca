//! State enums for disputes and votes.

use crate::error::LayerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity tier of a dispute. Drives both the fee and the slash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeCategory {
    Warning,
    Minor,
    Major,
}

/// What happens to a reporter once a dispute against them is fully funded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JailPolicy {
    /// Jailed with no expiry; the reporter must unjail manually.
    UntilUnjailed,
    /// Jailed for a fixed number of seconds.
    For(u64),
    /// Removed from the reporter set; jailing is moot.
    Removed,
}

impl DisputeCategory {
    /// Share of the reporter's stake charged as fee and escrowed as slash.
    pub fn slash_percent(&self) -> u128 {
        match self {
            Self::Warning => 1,
            Self::Minor => 5,
            Self::Major => 100,
        }
    }

    pub fn jail_policy(&self, minor_jail_secs: u64) -> JailPolicy {
        match self {
            Self::Warning => JailPolicy::UntilUnjailed,
            Self::Minor => JailPolicy::For(minor_jail_secs),
            Self::Major => JailPolicy::Removed,
        }
    }
}

impl fmt::Display for DisputeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Warning => "warning",
            Self::Minor => "minor",
            Self::Major => "major",
        };
        f.write_str(s)
    }
}

impl FromStr for DisputeCategory {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warning" => Ok(Self::Warning),
            "minor" => Ok(Self::Minor),
            "major" => Ok(Self::Major),
            _ => Err(LayerError::UnknownCategory(s.to_string())),
        }
    }
}

/// Lifecycle of a single dispute round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    /// Collecting the dispute fee.
    Prevote,
    /// Fee met, reporter slashed, ballot open.
    Voting,
    /// Outcome decided; settlement may run.
    Resolved,
    /// Vote ended without a majority; a new round may be opened.
    Unresolved,
    /// Fee never met before the prevote window closed.
    Failed,
}

impl DisputeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Failed)
    }
}

impl fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Prevote => "prevote",
            Self::Voting => "voting",
            Self::Resolved => "resolved",
            Self::Unresolved => "unresolved",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A voter's ballot option.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Support,
    Against,
    Invalid,
}

impl VoteChoice {
    pub const ALL: [VoteChoice; 3] = [Self::Support, Self::Against, Self::Invalid];
}

impl FromStr for VoteChoice {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "support" => Ok(Self::Support),
            "against" => Ok(Self::Against),
            "invalid" => Ok(Self::Invalid),
            _ => Err(LayerError::UnknownVoteChoice(s.to_string())),
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Support => "support",
            Self::Against => "against",
            Self::Invalid => "invalid",
        };
        f.write_str(s)
    }
}

/// Result recorded on a vote once it has been tallied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteResult {
    #[default]
    NoTally,
    Support,
    Against,
    Invalid,
    NoQuorumMajoritySupport,
    NoQuorumMajorityAgainst,
    NoQuorumMajorityInvalid,
}

impl VoteResult {
    /// The ballot option this result settles as, or `None` before tallying.
    pub fn outcome(&self) -> Option<VoteChoice> {
        match self {
            Self::NoTally => None,
            Self::Support | Self::NoQuorumMajoritySupport => Some(VoteChoice::Support),
            Self::Against | Self::NoQuorumMajorityAgainst => Some(VoteChoice::Against),
            Self::Invalid | Self::NoQuorumMajorityInvalid => Some(VoteChoice::Invalid),
        }
    }

    pub fn is_tallied(&self) -> bool {
        !matches!(self, Self::NoTally)
    }

    pub fn majority(choice: VoteChoice) -> Self {
        match choice {
            VoteChoice::Support => Self::Support,
            VoteChoice::Against => Self::Against,
            VoteChoice::Invalid => Self::Invalid,
        }
    }

    pub fn no_quorum(choice: VoteChoice) -> Self {
        match choice {
            VoteChoice::Support => Self::NoQuorumMajoritySupport,
            VoteChoice::Against => Self::NoQuorumMajorityAgainst,
            VoteChoice::Invalid => Self::NoQuorumMajorityInvalid,
        }
    }
}

impl fmt::Display for VoteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NoTally => "no_tally",
            Self::Support => "support",
            Self::Against => "against",
            Self::Invalid => "invalid",
            Self::NoQuorumMajoritySupport => "no_quorum_majority_support",
            Self::NoQuorumMajorityAgainst => "no_quorum_majority_against",
            Self::NoQuorumMajorityInvalid => "no_quorum_majority_invalid",
        };
        f.write_str(s)
    }
}
