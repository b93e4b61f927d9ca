//! Shared fixtures for the keeper scenario tests.
//!
//! The default world is sized so that each class splits 3:1 between the
//! "majority" and "minority" voters:
//!
//! | class        | total      | majority side       | minority side    |
//! |--------------|------------|---------------------|------------------|
//! | users        | 400 tips   | `user` 300          | `tipper` 100     |
//! | reporters    | 400 000    | `reporter_a` 300 000| `reporter` 100 000 |
//! | tokenholders | 1 616 000  | `user` 1 212 000    | nobody           |

#![allow(dead_code)]

use layer_dispute::{DisputeEvent, Keeper};
use layer_nullables::{NullBlockClock, NullDisputeStore, NullLedger, NullOracle, NullStakeRegistry};
use layer_types::{
    AccountAddress, Amount, BlockHeader, DisputeCategory, DisputeParams, MicroReport, Timestamp,
};
use std::sync::{Arc, Mutex};

pub const T0: u64 = 1_700_000_000;
pub const START_HEIGHT: u64 = 10;
pub const VOTE_SECS: u64 = 2 * 24 * 60 * 60;
pub const DAY_SECS: u64 = 24 * 60 * 60;

pub type TestKeeper = Keeper<NullDisputeStore, NullLedger, NullStakeRegistry, NullOracle>;

pub fn addr(name: &str) -> AccountAddress {
    AccountAddress::new(format!("tellor1{name}"))
}

pub fn reporter() -> AccountAddress {
    addr("reporter")
}

pub fn reporter_a() -> AccountAddress {
    addr("reportera")
}

pub fn reporter_b() -> AccountAddress {
    addr("reporterb")
}

pub fn user() -> AccountAddress {
    addr("user")
}

pub fn tipper() -> AccountAddress {
    addr("tipper")
}

pub fn alice() -> AccountAddress {
    addr("alice")
}

pub fn bob() -> AccountAddress {
    addr("bob")
}

pub fn team() -> AccountAddress {
    addr("team")
}

pub fn params() -> DisputeParams {
    DisputeParams {
        min_dispute_fee: Amount::new(10),
        ..DisputeParams::default()
    }
}

/// A report by `reporter()` submitted `age` seconds before T0.
pub fn report_aged(age: u64) -> MicroReport {
    MicroReport {
        reporter: reporter(),
        power: 100,
        query_type: "SpotPrice".into(),
        query_id: vec![0x83; 32],
        aggregate_method: "weighted-median".into(),
        value: "0000000000000000000000000000000000000000000000000000000000000064".into(),
        timestamp: Timestamp::new(T0 - age),
        cyclelist: true,
        block_number: START_HEIGHT - 1,
    }
}

pub fn report() -> MicroReport {
    report_aged(60)
}

pub struct Harness {
    pub keeper: TestKeeper,
    pub ledger: NullLedger,
    pub stake: NullStakeRegistry,
    pub oracle: NullOracle,
    pub clock: NullBlockClock,
    pub events: Arc<Mutex<Vec<DisputeEvent>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_params(params())
    }

    pub fn with_params(params: DisputeParams) -> Self {
        let ledger = NullLedger::new();
        let stake = NullStakeRegistry::new(ledger.clone());
        let oracle = NullOracle::new();

        stake.add_reporter(&reporter(), 100_000);
        stake.add_reporter(&reporter_a(), 300_000);
        stake.add_reporter(&reporter_b(), 1_000);
        stake.checkpoint(START_HEIGHT - 1);

        ledger.fund(&alice(), 1_000);
        ledger.fund(&bob(), 2_000);
        ledger.fund(&user(), 1_212_000);
        oracle.tip(&user(), 300, 5);
        oracle.tip(&tipper(), 100, 5);

        Self::from_parts(ledger, stake, oracle, params)
    }

    /// A harness over collaborators the caller has already seeded.
    pub fn from_parts(
        ledger: NullLedger,
        stake: NullStakeRegistry,
        oracle: NullOracle,
        params: DisputeParams,
    ) -> Self {
        let mut keeper = Keeper::new(
            NullDisputeStore::new(),
            ledger.clone(),
            stake.clone(),
            oracle.clone(),
            params,
        )
        .unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        keeper.subscribe(Box::new(move |e: &DisputeEvent| sink.lock().unwrap().push(e.clone())));
        Self {
            keeper,
            ledger,
            stake,
            oracle,
            clock: NullBlockClock::new(START_HEIGHT, T0),
            events,
        }
    }

    pub fn now(&self) -> BlockHeader {
        self.clock.current()
    }

    /// Alice opens a warning dispute against `report()` paying the full fee;
    /// voting starts immediately.
    pub fn open_warning(&self) -> u64 {
        self.keeper
            .propose_dispute(
                &alice(),
                report(),
                DisputeCategory::Warning,
                Amount::new(1_000),
                false,
                &self.now(),
            )
            .unwrap()
    }

    pub fn vote(&self, voter: &AccountAddress, id: u64, choice: layer_types::VoteChoice) {
        self.keeper.vote(voter, id, choice, &self.now()).unwrap();
    }

    /// Step past the end of the current ballot and run the block hook.
    pub fn close_ballot(&self) -> layer_dispute::BlockReport {
        let block = self.clock.advance(VOTE_SECS + 1);
        self.keeper.begin_block(&block).unwrap()
    }

    pub fn next_block(&self) -> layer_dispute::BlockReport {
        let block = self.clock.advance(6);
        self.keeper.begin_block(&block).unwrap()
    }

    pub fn events(&self) -> Vec<DisputeEvent> {
        self.events.lock().unwrap().clone()
    }
}
