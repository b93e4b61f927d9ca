//! Dispute module parameters.
//!
//! Durations are block-time seconds. Every field has a default so a partial
//! `[dispute]` table in the node config is enough.

use crate::address::AccountAddress;
use crate::amount::Amount;
use crate::time::{ONE_DAY_SECS, TWO_DAYS_SECS};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeParams {
    /// Account that casts the team vote and may rotate itself.
    #[serde(default)]
    pub team_address: Option<AccountAddress>,

    /// Smallest fee accepted when opening or topping up a dispute.
    #[serde(default = "default_min_dispute_fee", with = "fee_as_u64")]
    pub min_dispute_fee: Amount,

    /// How long a new dispute may collect fees before it fails.
    #[serde(default = "default_prevote_duration_secs")]
    pub prevote_duration_secs: u64,

    /// Length of each ballot window.
    #[serde(default = "default_voting_duration_secs")]
    pub voting_duration_secs: u64,

    /// Grace period after an unresolved vote during which a new round may open.
    #[serde(default = "default_unresolved_extension_secs")]
    pub unresolved_extension_secs: u64,

    /// Reports older than this cannot be disputed or used as evidence.
    #[serde(default = "default_evidence_max_age_secs")]
    pub evidence_max_age_secs: u64,

    /// Jail duration for minor disputes.
    #[serde(default = "default_minor_jail_secs")]
    pub minor_jail_secs: u64,
}

/// TOML integers are 64-bit, so the fee is carried as a `u64` in config files.
mod fee_as_u64 {
    use crate::amount::Amount;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(fee: &Amount, s: S) -> Result<S::Ok, S::Error> {
        let raw = u64::try_from(fee.raw()).map_err(serde::ser::Error::custom)?;
        s.serialize_u64(raw)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Amount, D::Error> {
        u64::deserialize(d).map(|raw| Amount::new(u128::from(raw)))
    }
}

fn default_min_dispute_fee() -> Amount {
    Amount::new(10_000)
}
fn default_prevote_duration_secs() -> u64 {
    ONE_DAY_SECS
}
fn default_voting_duration_secs() -> u64 {
    TWO_DAYS_SECS
}
fn default_unresolved_extension_secs() -> u64 {
    ONE_DAY_SECS
}
fn default_evidence_max_age_secs() -> u64 {
    21 * ONE_DAY_SECS
}
fn default_minor_jail_secs() -> u64 {
    600
}

impl Default for DisputeParams {
    fn default() -> Self {
        Self {
            team_address: None,
            min_dispute_fee: default_min_dispute_fee(),
            prevote_duration_secs: default_prevote_duration_secs(),
            voting_duration_secs: default_voting_duration_secs(),
            unresolved_extension_secs: default_unresolved_extension_secs(),
            evidence_max_age_secs: default_evidence_max_age_secs(),
            minor_jail_secs: default_minor_jail_secs(),
        }
    }
}

impl DisputeParams {
    pub fn with_team(mut self, team: AccountAddress) -> Self {
        self.team_address = Some(team);
        self
    }
}
