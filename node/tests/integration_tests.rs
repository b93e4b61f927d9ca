//! End-to-end tests: JSON and typed messages → block processor → keeper →
//! LMDB persistence → queries.
//!
//! The ledger, staking and oracle modules are the in-memory nullables; the
//! store is a real LMDB environment in a temp dir.

use layer_dispute::{DisputeError, TallyOutcome};
use layer_node::message::{
    AddFeeMsg, ClaimRewardMsg, ProposeDisputeMsg, VoteMsg, WithdrawFeeRefundMsg,
};
use layer_node::{Block, DisputeMsg, DisputeNode, DisputeQuery, MsgOutcome, NodeConfig, NodeError};
use layer_nullables::{NullLedger, NullOracle, NullStakeRegistry};
use layer_types::{
    AccountAddress, Amount, BlockHeader, DisputeCategory, DisputeParams, MicroReport, Timestamp,
    VoteChoice, VoteResult,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const T0: u64 = 1_700_000_000;
const DAY: u64 = 24 * 60 * 60;

type Node = DisputeNode<NullLedger, NullStakeRegistry, NullOracle>;

fn addr(name: &str) -> AccountAddress {
    AccountAddress::new(format!("tellor1{name}"))
}

struct World {
    ledger: NullLedger,
    stake: NullStakeRegistry,
    oracle: NullOracle,
}

/// Reporter 100 000 and reportera 300 000 bonded; user holds 3/4 of the
/// liquid supply and 3/4 of the tips.
fn world() -> World {
    let ledger = NullLedger::new();
    let stake = NullStakeRegistry::new(ledger.clone());
    let oracle = NullOracle::new();
    stake.add_reporter(&addr("reporter"), 100_000);
    stake.add_reporter(&addr("reportera"), 300_000);
    stake.add_reporter(&addr("reporterb"), 1_000);
    stake.checkpoint(9);
    ledger.fund(&addr("alice"), 1_000);
    ledger.fund(&addr("bob"), 2_000);
    ledger.fund(&addr("user"), 1_212_000);
    oracle.tip(&addr("user"), 300, 5);
    oracle.tip(&addr("tipper"), 100, 5);
    World {
        ledger,
        stake,
        oracle,
    }
}

fn config(dir: &tempfile::TempDir) -> NodeConfig {
    NodeConfig {
        data_dir: dir.path().to_path_buf(),
        map_size: 64 * 1024 * 1024,
        enable_metrics: true,
        dispute: DisputeParams {
            min_dispute_fee: Amount::new(10),
            ..DisputeParams::default()
        },
        ..NodeConfig::default()
    }
}

fn open(dir: &tempfile::TempDir, w: &World) -> Node {
    DisputeNode::open(
        config(dir),
        w.ledger.clone(),
        w.stake.clone(),
        w.oracle.clone(),
    )
    .expect("open node")
}

fn header(height: u64, secs_after_t0: u64) -> BlockHeader {
    BlockHeader::new(height, Timestamp::new(T0 + secs_after_t0))
}

fn report() -> MicroReport {
    MicroReport {
        reporter: addr("reporter"),
        power: 100,
        query_type: "SpotPrice".into(),
        query_id: vec![0x83; 32],
        aggregate_method: "weighted-median".into(),
        value: "64".into(),
        timestamp: Timestamp::new(T0 - 60),
        cyclelist: true,
        block_number: 9,
    }
}

fn propose(fee: u128) -> DisputeMsg {
    DisputeMsg::ProposeDispute(ProposeDisputeMsg {
        creator: addr("alice"),
        report: report(),
        category: DisputeCategory::Warning,
        fee: Amount::new(fee),
        pay_from_bond: false,
    })
}

fn vote(voter: &str, choice: VoteChoice) -> DisputeMsg {
    DisputeMsg::Vote(VoteMsg {
        voter: addr(voter),
        dispute_id: 1,
        choice,
    })
}

fn claim(voter: &str) -> DisputeMsg {
    DisputeMsg::ClaimReward(ClaimRewardMsg {
        voter: addr(voter),
        dispute_id: 1,
    })
}

fn refund(payer: &str) -> DisputeMsg {
    DisputeMsg::WithdrawFeeRefund(WithdrawFeeRefundMsg {
        payer: addr(payer),
        dispute_id: 1,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn dispute_runs_from_proposal_to_payout() {
    let dir = tempfile::tempdir().unwrap();
    let w = world();
    let mut node = open(&dir, &w);

    let b10 = node
        .process_block(&Block::new(header(10, 0), vec![propose(1_000)]))
        .unwrap();
    assert_eq!(b10.msgs[0].as_ref().unwrap(), &MsgOutcome::Proposed { dispute_id: 1 });
    assert_eq!(b10.refreshed, 1);

    let b11 = node
        .process_block(&Block::new(
            header(11, 6),
            vec![
                vote("user", VoteChoice::Support),
                vote("reportera", VoteChoice::Support),
            ],
        ))
        .unwrap();
    assert_eq!(
        b11.msgs[0].as_ref().unwrap(),
        &MsgOutcome::Voted(TallyOutcome::StillVoting)
    );
    assert!(matches!(
        b11.msgs[1].as_ref().unwrap(),
        MsgOutcome::Voted(TallyOutcome::Decided {
            result: VoteResult::Support,
            ..
        })
    ));

    let b12 = node
        .process_block(&Block::new(
            header(12, 12),
            vec![
                refund("alice"),
                claim("user"),
                claim("reportera"),
                claim("user"),
            ],
        ))
        .unwrap();
    assert_eq!(b12.begin.executed, vec![1]);
    assert_eq!(
        b12.msgs[0].as_ref().unwrap(),
        &MsgOutcome::FeeRefunded(Amount::new(1_950))
    );
    assert_eq!(
        b12.msgs[1].as_ref().unwrap(),
        &MsgOutcome::RewardClaimed(Amount::new(16))
    );
    assert_eq!(
        b12.msgs[2].as_ref().unwrap(),
        &MsgOutcome::RewardClaimed(Amount::new(8))
    );
    assert!(matches!(b12.msgs[3], Err(DisputeError::AlreadyDone(_))));
    assert_eq!(b12.failed_msgs(), 1);

    assert_eq!(node.query(&DisputeQuery::Dust).unwrap(), 999_999);
    assert_eq!(
        node.query(&DisputeQuery::OpenDisputes).unwrap(),
        serde_json::json!([])
    );

    let metrics = node.metrics().expect("metrics enabled");
    assert_eq!(metrics.disputes_proposed.get(), 1);
    assert_eq!(metrics.votes_cast.get(), 2);
    assert_eq!(metrics.disputes_executed.get(), 1);
    assert_eq!(metrics.refunds_withdrawn.get(), 1);
    assert_eq!(metrics.rewards_claimed.get(), 2);
    assert_eq!(metrics.msgs_failed.get(), 1);
    assert_eq!(metrics.open_disputes.get(), 0);
    assert_eq!(metrics.block_height.get(), 12);
}

#[test]
fn state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let w = world();
    {
        let mut node = open(&dir, &w);
        node.process_block(&Block::new(header(10, 0), vec![propose(400)]))
            .unwrap();
    }

    let mut node = open(&dir, &w);
    let dispute = node
        .query_json(r#"{"dispute":{"dispute_id":1}}"#)
        .unwrap();
    assert_eq!(dispute["status"], "prevote");
    assert_eq!(dispute["fee_total"], 400);
    assert_eq!(node.metrics().unwrap().open_disputes.get(), 1);

    // Ids keep counting from the persisted value.
    let other = MicroReport {
        query_id: vec![0x11; 32],
        ..report()
    };
    let result = node
        .process_block(&Block::new(
            header(11, 6),
            vec![DisputeMsg::ProposeDispute(ProposeDisputeMsg {
                creator: addr("bob"),
                report: other,
                category: DisputeCategory::Warning,
                fee: Amount::new(1_000),
                pay_from_bond: false,
            })],
        ))
        .unwrap();
    assert_eq!(
        result.msgs[0].as_ref().unwrap(),
        &MsgOutcome::Proposed { dispute_id: 2 }
    );
}

#[test]
fn unfunded_dispute_expires_and_refunds() {
    let dir = tempfile::tempdir().unwrap();
    let w = world();
    let mut node = open(&dir, &w);

    node.process_block(&Block::new(header(10, 0), vec![propose(400)]))
        .unwrap();
    let lapsed = node
        .process_block(&Block::new(header(11, DAY + 1), vec![refund("alice")]))
        .unwrap();

    assert_eq!(lapsed.begin.expired, vec![1]);
    assert_eq!(
        lapsed.msgs[0].as_ref().unwrap(),
        &MsgOutcome::FeeRefunded(Amount::new(380))
    );
    assert_eq!(w.ledger.burned(), 20);
    assert_eq!(w.ledger.account_balance(&addr("alice")), 980);
    assert_eq!(node.metrics().unwrap().disputes_expired.get(), 1);

    let failed = node
        .query(&DisputeQuery::Disputes {
            status: Some(layer_types::DisputeStatus::Failed),
        })
        .unwrap();
    assert_eq!(failed.as_array().map(Vec::len), Some(1));
}

#[test]
fn rejected_message_leaves_block_running() {
    let dir = tempfile::tempdir().unwrap();
    let w = world();
    let mut node = open(&dir, &w);

    let result = node
        .process_block(&Block::new(
            header(10, 0),
            vec![
                propose(1),
                propose(400),
                DisputeMsg::AddFeeToDispute(AddFeeMsg {
                    payer: addr("nobody"),
                    dispute_id: 1,
                    amount: Amount::new(100),
                    pay_from_bond: false,
                }),
            ],
        ))
        .unwrap();

    assert!(matches!(result.msgs[0], Err(DisputeError::InvalidFee(_))));
    assert_eq!(
        result.msgs[1].as_ref().unwrap(),
        &MsgOutcome::Proposed { dispute_id: 1 }
    );
    assert!(matches!(
        result.msgs[2],
        Err(DisputeError::InsufficientFunds(_))
    ));
    let fee = node
        .query(&DisputeQuery::Dispute { dispute_id: 1 })
        .unwrap()["fee_total"]
        .clone();
    assert_eq!(fee, 400);
}

#[test]
fn blocks_must_move_forward() {
    let dir = tempfile::tempdir().unwrap();
    let w = world();
    let mut node = open(&dir, &w);

    node.process_block(&Block::empty(header(10, 0))).unwrap();
    assert!(matches!(
        node.process_block(&Block::empty(header(10, 5))),
        Err(NodeError::InvalidBlock(_))
    ));
    assert!(matches!(
        node.process_block(&Block::empty(BlockHeader::new(11, Timestamp::new(T0 - 1)))),
        Err(NodeError::InvalidBlock(_))
    ));
    assert_eq!(node.last_header(), Some(header(10, 0)));
}

#[test]
fn json_block_is_all_or_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let w = world();
    let mut node = open(&dir, &w);

    let bad = node.process_json_block(
        header(10, 0),
        &[r#"{"vote":{"voter":"tellor1user","dispute_id":1,"choice":"support"}}"#, "{"],
    );
    assert!(matches!(bad, Err(NodeError::InvalidMessage(_))));
    assert_eq!(node.last_header(), None);

    let ok = node
        .process_json_block(
            header(10, 0),
            &[r#"{"vote":{"voter":"tellor1user","dispute_id":1,"choice":"support"}}"#],
        )
        .unwrap();
    assert!(matches!(ok.msgs[0], Err(DisputeError::NotFound { .. })));
}

#[test]
fn unknown_records_surface_as_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let w = world();
    let node = open(&dir, &w);

    let err = node
        .query(&DisputeQuery::Dispute { dispute_id: 42 })
        .unwrap_err();
    assert!(layer_node::query::is_not_found(&err));
    assert_eq!(node.query(&DisputeQuery::Team).unwrap(), serde_json::Value::Null);
    assert_eq!(node.query(&DisputeQuery::Params).unwrap()["min_dispute_fee"], 10);
}
