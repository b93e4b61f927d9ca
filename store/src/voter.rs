//! Individual ballots, per-class vote counts and delegated-power bookkeeping.

use crate::StoreError;
use layer_types::{AccountAddress, VoteChoice};
use serde::{Deserialize, Serialize};

/// The four independently normalized voting constituencies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StakeholderClass {
    /// Weighted by tips paid up to the dispute's block.
    Users,
    /// Weighted by reporting stake, delegations included.
    Reporters,
    /// Weighted by account balance.
    Tokenholders,
    /// The single team account.
    Team,
}

impl StakeholderClass {
    pub const ALL: [StakeholderClass; 4] = [
        Self::Users,
        Self::Reporters,
        Self::Tokenholders,
        Self::Team,
    ];

    /// Classes that share in voter rewards.
    pub const REWARDED: [StakeholderClass; 3] = [Self::Users, Self::Reporters, Self::Tokenholders];
}

/// One account's ballot for one dispute round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub choice: VoteChoice,
    /// Combined normalized weight at cast time, in `POWER_REDUCTION` units.
    pub voter_power: u128,
    pub user_power: u128,
    pub reporter_power: u128,
    pub tokenholder_power: u128,
    pub team_power: u128,
    pub reward_claimed: bool,
}

impl Voter {
    pub fn class_power(&self, class: StakeholderClass) -> u128 {
        match class {
            StakeholderClass::Users => self.user_power,
            StakeholderClass::Reporters => self.reporter_power,
            StakeholderClass::Tokenholders => self.tokenholder_power,
            StakeholderClass::Team => self.team_power,
        }
    }
}

/// Raw power behind each option within one class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCounts {
    pub support: u128,
    pub against: u128,
    pub invalid: u128,
}

impl VoteCounts {
    pub fn get(&self, choice: VoteChoice) -> u128 {
        match choice {
            VoteChoice::Support => self.support,
            VoteChoice::Against => self.against,
            VoteChoice::Invalid => self.invalid,
        }
    }

    pub fn add(&mut self, choice: VoteChoice, power: u128) {
        let slot = match choice {
            VoteChoice::Support => &mut self.support,
            VoteChoice::Against => &mut self.against,
            VoteChoice::Invalid => &mut self.invalid,
        };
        *slot = slot.saturating_add(power);
    }

    pub fn sub(&mut self, choice: VoteChoice, power: u128) {
        let slot = match choice {
            VoteChoice::Support => &mut self.support,
            VoteChoice::Against => &mut self.against,
            VoteChoice::Invalid => &mut self.invalid,
        };
        *slot = slot.saturating_sub(power);
    }

    pub fn total(&self) -> u128 {
        self.support
            .saturating_add(self.against)
            .saturating_add(self.invalid)
    }
}

/// Per-round aggregate of every class's vote counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeholderVoteCounts {
    pub users: VoteCounts,
    pub reporters: VoteCounts,
    pub tokenholders: VoteCounts,
    pub team: VoteCounts,
}

impl StakeholderVoteCounts {
    pub fn class(&self, class: StakeholderClass) -> &VoteCounts {
        match class {
            StakeholderClass::Users => &self.users,
            StakeholderClass::Reporters => &self.reporters,
            StakeholderClass::Tokenholders => &self.tokenholders,
            StakeholderClass::Team => &self.team,
        }
    }

    pub fn class_mut(&mut self, class: StakeholderClass) -> &mut VoteCounts {
        match class {
            StakeholderClass::Users => &mut self.users,
            StakeholderClass::Reporters => &mut self.reporters,
            StakeholderClass::Tokenholders => &mut self.tokenholders,
            StakeholderClass::Team => &mut self.team,
        }
    }

    /// Element-wise sum, used to aggregate a lineage.
    pub fn merge(&mut self, other: &StakeholderVoteCounts) {
        for class in StakeholderClass::ALL {
            let theirs = *other.class(class);
            let mine = self.class_mut(class);
            for choice in VoteChoice::ALL {
                mine.add(choice, theirs.get(choice));
            }
        }
    }

    pub fn total(&self) -> u128 {
        StakeholderClass::ALL
            .iter()
            .fold(0u128, |acc, c| acc.saturating_add(self.class(*c).total()))
    }
}

pub trait VoterStore {
    fn get_voter(&self, dispute_id: u64, voter: &AccountAddress) -> Result<Voter, StoreError>;

    fn put_voter(
        &self,
        dispute_id: u64,
        voter: &AccountAddress,
        record: &Voter,
    ) -> Result<(), StoreError>;

    fn remove_voter(&self, dispute_id: u64, voter: &AccountAddress) -> Result<(), StoreError>;

    fn has_voter(&self, dispute_id: u64, voter: &AccountAddress) -> Result<bool, StoreError>;

    /// Every ballot cast in a round, ordered by address.
    fn voters_for_dispute(&self, dispute_id: u64)
        -> Result<Vec<(AccountAddress, Voter)>, StoreError>;

    /// Vote counts for a round; zeroed counts if nobody voted yet.
    fn get_vote_counts(&self, dispute_id: u64) -> Result<StakeholderVoteCounts, StoreError>;

    fn put_vote_counts(
        &self,
        dispute_id: u64,
        counts: &StakeholderVoteCounts,
    ) -> Result<(), StoreError>;

    /// Delegated tokens that already voted ahead of their reporter in a round.
    fn get_delegated_power_voted(
        &self,
        reporter: &AccountAddress,
        dispute_id: u64,
    ) -> Result<Option<u128>, StoreError>;

    fn put_delegated_power_voted(
        &self,
        reporter: &AccountAddress,
        dispute_id: u64,
        power: u128,
    ) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_every_cell() {
        let mut a = StakeholderVoteCounts::default();
        a.users.add(VoteChoice::Support, 10);
        a.team.add(VoteChoice::Against, 1);
        let mut b = StakeholderVoteCounts::default();
        b.users.add(VoteChoice::Support, 5);
        b.reporters.add(VoteChoice::Invalid, 7);

        a.merge(&b);
        assert_eq!(a.users.support, 15);
        assert_eq!(a.reporters.invalid, 7);
        assert_eq!(a.team.against, 1);
        assert_eq!(a.total(), 23);
    }

    #[test]
    fn sub_saturates() {
        let mut counts = VoteCounts::default();
        counts.add(VoteChoice::Support, 3);
        counts.sub(VoteChoice::Support, 5);
        assert_eq!(counts.support, 0);
    }
}
