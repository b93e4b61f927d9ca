//! Events emitted on every dispute state change.

use layer_types::{AccountAddress, Amount, DisputeCategory, DisputeStatus, VoteChoice, VoteResult};

/// Dispute-level events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisputeEvent {
    /// A first round was opened.
    Proposed {
        dispute_id: u64,
        reporter: AccountAddress,
        category: DisputeCategory,
        fee_paid: Amount,
    },
    /// An unresolved dispute was escalated.
    RoundAdded {
        dispute_id: u64,
        previous_id: u64,
        round: u32,
        burn_amount: Amount,
    },
    FeeAdded {
        dispute_id: u64,
        payer: AccountAddress,
        amount: Amount,
    },
    /// Fee met, reporter slashed, ballot open.
    VotingStarted {
        dispute_id: u64,
        slash_amount: Amount,
    },
    Voted {
        dispute_id: u64,
        voter: AccountAddress,
        choice: VoteChoice,
        voter_power: u128,
    },
    Tallied {
        dispute_id: u64,
        result: VoteResult,
        status: DisputeStatus,
    },
    Executed {
        dispute_id: u64,
        result: VoteResult,
        burned: Amount,
        voter_reward: Amount,
    },
    /// A prevote dispute ran out of time.
    Expired { dispute_id: u64 },
    FeeRefunded {
        dispute_id: u64,
        payer: AccountAddress,
        refund: Amount,
        bond_reward: Amount,
    },
    RewardClaimed {
        dispute_id: u64,
        voter: AccountAddress,
        amount: Amount,
    },
    EvidenceAdded { dispute_id: u64, reports: usize },
    TeamUpdated {
        previous: AccountAddress,
        current: AccountAddress,
    },
}

/// Synchronous fan-out event bus for dispute events.
///
/// Listeners are invoked inline on the emitting thread; keep handlers fast to
/// avoid stalling block processing.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&DisputeEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&DisputeEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &DisputeEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
