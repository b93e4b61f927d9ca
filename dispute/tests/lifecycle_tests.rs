//! Proposal, fee collection, expiry and evidence.

mod common;

use common::*;
use layer_dispute::{DisputeError, DisputeEvent};
use layer_store::{DisputeStore, FeePayerStore};
use layer_types::{Amount, DisputeCategory, DisputeStatus, JailPolicy, Timestamp, VoteChoice};

#[test]
fn full_fee_starts_voting_and_slashes() {
    let h = Harness::new();
    let id = h.open_warning();
    assert_eq!(id, 1);

    let d = h.keeper.dispute(id).unwrap();
    assert_eq!(d.status, DisputeStatus::Voting);
    assert_eq!(d.dispute_fee, Amount::new(1_000));
    assert_eq!(d.slash_amount, Amount::new(1_000));
    assert_eq!(d.burn_amount, Amount::new(50));
    assert_eq!(d.fee_total, Amount::new(1_000));
    assert_eq!(d.end_time, Timestamp::new(T0 + VOTE_SECS));
    assert_eq!(d.prev_dispute_ids, vec![1]);

    assert_eq!(h.stake.stake_of(&reporter()), 99_000);
    assert_eq!(h.stake.jail_status(&reporter()), Some(JailPolicy::UntilUnjailed));
    assert_eq!(h.ledger.module_balance(), 2_000);
    assert_eq!(h.ledger.account_balance(&alice()), 0);
    assert_eq!(h.oracle.flagged().len(), 1);

    let info = h.keeper.dispute_block_info(id).unwrap();
    assert_eq!(info.total_reporter_power, 400_000);
    assert_eq!(info.total_user_tips, 400);
    assert_eq!(info.total_token_supply, Amount::new(1_616_000));

    let events = h.events();
    assert!(matches!(events[0], DisputeEvent::Proposed { dispute_id: 1, .. }));
    assert!(matches!(events[1], DisputeEvent::VotingStarted { dispute_id: 1, .. }));
}

#[test]
fn overpayment_is_capped_at_the_dispute_fee() {
    let h = Harness::new();
    h.ledger.fund(&alice(), 9_000);
    h.keeper
        .propose_dispute(
            &alice(),
            report(),
            DisputeCategory::Warning,
            Amount::new(5_000),
            false,
            &h.now(),
        )
        .unwrap();
    assert_eq!(h.ledger.account_balance(&alice()), 9_000);
    assert_eq!(
        h.keeper.fee_payer(1, &alice()).unwrap().amount,
        Amount::new(1_000)
    );
}

#[test]
fn partial_fee_waits_in_prevote_until_topped_up() {
    let h = Harness::new();
    h.ledger.fund(&alice(), 10_000);
    let id = h
        .keeper
        .propose_dispute(
            &alice(),
            report(),
            DisputeCategory::Minor,
            Amount::new(2_000),
            false,
            &h.now(),
        )
        .unwrap();
    let d = h.keeper.dispute(id).unwrap();
    assert_eq!(d.status, DisputeStatus::Prevote);
    assert_eq!(d.dispute_fee, Amount::new(5_000));
    assert_eq!(d.end_time, Timestamp::new(T0 + DAY_SECS));
    assert_eq!(h.stake.stake_of(&reporter()), 100_000);
    assert_eq!(h.stake.jail_status(&reporter()), None);

    let too_small = h
        .keeper
        .add_fee_to_dispute(&bob(), id, Amount::new(5), false, &h.now())
        .unwrap_err();
    assert!(matches!(too_small, DisputeError::InvalidFee(_)));

    h.keeper
        .add_fee_to_dispute(&bob(), id, Amount::new(2_000), false, &h.now())
        .unwrap();
    h.keeper
        .add_fee_to_dispute(&alice(), id, Amount::new(5_000), false, &h.now())
        .unwrap();

    let d = h.keeper.dispute(id).unwrap();
    assert_eq!(d.status, DisputeStatus::Voting);
    assert_eq!(d.fee_total, Amount::new(5_000));
    // Alice's second payment is capped at the 1 000 still missing.
    assert_eq!(h.ledger.account_balance(&alice()), 11_000 - 3_000);
    assert_eq!(
        h.keeper.fee_payer(id, &alice()).unwrap().amount,
        Amount::new(3_000)
    );
    assert_eq!(h.keeper.fee_payer(id, &bob()).unwrap().amount, Amount::new(2_000));
    assert_eq!(h.stake.stake_of(&reporter()), 95_000);
    assert_eq!(h.stake.jail_status(&reporter()), Some(JailPolicy::For(600)));

    let again = h
        .keeper
        .add_fee_to_dispute(&bob(), id, Amount::new(100), false, &h.now())
        .unwrap_err();
    assert!(matches!(again, DisputeError::AlreadyDone(_)));
}

#[test]
fn payment_sources_cannot_be_mixed() {
    let h = Harness::new();
    h.stake.add_reporter(&bob(), 50_000);
    let id = h
        .keeper
        .propose_dispute(
            &alice(),
            report(),
            DisputeCategory::Minor,
            Amount::new(500),
            false,
            &h.now(),
        )
        .unwrap();
    h.keeper
        .add_fee_to_dispute(&bob(), id, Amount::new(500), true, &h.now())
        .unwrap();
    assert_eq!(h.stake.stake_of(&bob()), 49_500);

    let err = h
        .keeper
        .add_fee_to_dispute(&bob(), id, Amount::new(500), false, &h.now())
        .unwrap_err();
    assert!(matches!(err, DisputeError::Validation(_)));
}

#[test]
fn proposal_validation() {
    let h = Harness::new();

    let below_min = h
        .keeper
        .propose_dispute(&alice(), report(), DisputeCategory::Warning, Amount::new(9), false, &h.now())
        .unwrap_err();
    assert!(matches!(below_min, DisputeError::InvalidFee(_)));

    let stale = h
        .keeper
        .propose_dispute(
            &alice(),
            report_aged(22 * DAY_SECS),
            DisputeCategory::Warning,
            Amount::new(1_000),
            false,
            &h.now(),
        )
        .unwrap_err();
    assert!(matches!(stale, DisputeError::Validation(_)));

    let own_bond = h
        .keeper
        .propose_dispute(&reporter(), report(), DisputeCategory::Warning, Amount::new(1_000), true, &h.now())
        .unwrap_err();
    assert!(matches!(own_bond, DisputeError::Validation(_)));

    let broke = h
        .keeper
        .propose_dispute(&addr("nobody"), report(), DisputeCategory::Warning, Amount::new(1_000), false, &h.now())
        .unwrap_err();
    assert!(matches!(broke, DisputeError::InsufficientFunds(_)));

    // Nothing above left a record behind.
    assert_eq!(h.keeper.store().next_dispute_id().unwrap(), 1);
    assert!(h.keeper.open_disputes().unwrap().is_empty());

    h.open_warning();
    let duplicate = h
        .keeper
        .propose_dispute(&bob(), report(), DisputeCategory::Warning, Amount::new(1_000), false, &h.now())
        .unwrap_err();
    assert!(matches!(duplicate, DisputeError::InvalidState(_)));
}

#[test]
fn expired_prevote_fails_and_refunds_with_dust() {
    let h = Harness::new();
    let id = h
        .keeper
        .propose_dispute(&alice(), report(), DisputeCategory::Minor, Amount::new(333), false, &h.now())
        .unwrap();
    h.keeper
        .add_fee_to_dispute(&bob(), id, Amount::new(667), false, &h.now())
        .unwrap();

    // Still inside the window: nothing happens.
    let early = h.keeper.begin_block(&h.clock.advance(DAY_SECS)).unwrap();
    assert!(early.expired.is_empty());

    let late_sweep = h.keeper.begin_block(&h.clock.advance(1)).unwrap();
    assert_eq!(late_sweep.expired, vec![id]);
    let d = h.keeper.dispute(id).unwrap();
    assert_eq!(d.status, DisputeStatus::Failed);
    assert!(!d.open);
    assert_eq!(h.ledger.burned(), 50);

    let late = h
        .keeper
        .add_fee_to_dispute(&bob(), id, Amount::new(100), false, &h.now())
        .unwrap_err();
    assert!(matches!(late, DisputeError::InvalidState(_)));

    assert_eq!(h.keeper.withdraw_fee_refund(&alice(), id).unwrap(), Amount::new(316));
    assert_eq!(h.keeper.dust().unwrap(), 350_000);
    assert_eq!(h.keeper.withdraw_fee_refund(&bob(), id).unwrap(), Amount::new(633));
    assert_eq!(h.keeper.dust().unwrap(), 0);
    assert_eq!(h.ledger.burned(), 51);
    assert_eq!(h.ledger.module_balance(), 0);

    let twice = h.keeper.withdraw_fee_refund(&alice(), id).unwrap_err();
    assert!(matches!(twice, DisputeError::NotFound { .. }));
    assert!(h.keeper.store().get_fee_payer(id, &alice()).is_err());
}

#[test]
fn open_index_drops_expired_disputes() {
    let h = Harness::new();
    h.ledger.fund(&alice(), 1_000);
    for age in [60, 120] {
        h.keeper
            .propose_dispute(
                &alice(),
                report_aged(age),
                DisputeCategory::Minor,
                Amount::new(100),
                false,
                &h.now(),
            )
            .unwrap();
    }
    let voting = h.open_warning();
    assert_eq!(h.keeper.open_disputes().unwrap(), vec![1, 2, 3]);

    let swept = h.keeper.begin_block(&h.clock.advance(DAY_SECS + 1)).unwrap();
    assert_eq!(swept.expired, vec![1, 2]);
    assert_eq!(h.keeper.open_disputes().unwrap(), vec![voting]);
    assert_eq!(
        h.keeper.disputes(Some(DisputeStatus::Failed)).unwrap().len(),
        2
    );
}

#[test]
fn evidence_must_come_from_the_disputed_reporter() {
    let h = Harness::new();
    let id = h.open_warning();

    let mut extra = report_aged(600);
    extra.value = "00".into();
    h.keeper
        .add_evidence(&bob(), id, vec![extra.clone()], &h.now())
        .unwrap();
    assert_eq!(h.keeper.dispute(id).unwrap().additional_evidence, vec![extra]);
    assert_eq!(h.oracle.flagged().len(), 2);

    let mut stranger = report();
    stranger.reporter = reporter_a();
    let err = h
        .keeper
        .add_evidence(&bob(), id, vec![stranger], &h.now())
        .unwrap_err();
    assert!(matches!(err, DisputeError::Validation(_)));

    let err = h.keeper.add_evidence(&bob(), id, Vec::new(), &h.now()).unwrap_err();
    assert!(matches!(err, DisputeError::Validation(_)));

    let err = h
        .keeper
        .add_evidence(&bob(), id, vec![report_aged(30 * DAY_SECS)], &h.now())
        .unwrap_err();
    assert!(matches!(err, DisputeError::Validation(_)));
}

#[test]
fn end_block_refreshes_snapshot_for_new_disputes() {
    let h = Harness::new();
    let id = h.open_warning();
    h.stake.add_reporter(&addr("latecomer"), 100_000);

    assert_eq!(h.keeper.end_block(&h.now()).unwrap(), 1);
    assert_eq!(
        h.keeper.dispute_block_info(id).unwrap().total_reporter_power,
        500_000
    );

    // A later height leaves the snapshot alone.
    h.stake.add_reporter(&addr("another"), 100_000);
    assert_eq!(h.keeper.end_block(&h.clock.advance(6)).unwrap(), 0);
    assert_eq!(
        h.keeper.dispute_block_info(id).unwrap().total_reporter_power,
        500_000
    );
}

#[test]
fn fee_that_would_trigger_an_unbacked_slash_is_not_taken() {
    let h = Harness::new();
    h.ledger.fund(&alice(), 10_000);
    h.ledger.fund(&bob(), 195_000);
    let major = h
        .keeper
        .propose_dispute(&alice(), report(), DisputeCategory::Major, Amount::new(500), false, &h.now())
        .unwrap();
    assert_eq!(h.keeper.dispute(major).unwrap().slash_amount, Amount::new(100_000));

    // A second dispute on another report escrows part of the same stake.
    h.keeper
        .propose_dispute(
            &alice(),
            report_aged(120),
            DisputeCategory::Minor,
            Amount::new(5_000),
            false,
            &h.now(),
        )
        .unwrap();
    assert_eq!(h.stake.stake_of(&reporter()), 95_000);
    let module = h.ledger.module_balance();

    let err = h
        .keeper
        .add_fee_to_dispute(&bob(), major, Amount::new(99_500), false, &h.now())
        .unwrap_err();
    assert!(matches!(err, DisputeError::InsufficientFunds(_)));

    assert_eq!(h.ledger.account_balance(&bob()), 197_000);
    assert_eq!(h.ledger.module_balance(), module);
    assert!(h.keeper.fee_payer(major, &bob()).is_err());
    let d = h.keeper.dispute(major).unwrap();
    assert_eq!(d.status, DisputeStatus::Prevote);
    assert_eq!(d.fee_total, Amount::new(500));
    assert_eq!(d.fee_payers.len(), 1);
    assert_eq!(h.stake.stake_of(&reporter()), 95_000);
}

#[test]
fn each_operation_commits_once() {
    let h = Harness::new();
    let before = h.keeper.store().committed_batches();
    let id = h.open_warning();
    assert_eq!(h.keeper.store().committed_batches(), before + 1);

    h.vote(&user(), id, VoteChoice::Support);
    assert_eq!(h.keeper.store().committed_batches(), before + 2);
}

#[test]
fn failed_write_hands_collected_tokens_back() {
    let h = Harness::new();
    h.keeper.store().fail_next_batches(1);

    let err = h
        .keeper
        .propose_dispute(&alice(), report(), DisputeCategory::Warning, Amount::new(1_000), false, &h.now())
        .unwrap_err();
    assert!(matches!(err, DisputeError::Store(_)));

    assert_eq!(h.ledger.account_balance(&alice()), 1_000);
    assert_eq!(h.stake.stake_of(&reporter()), 100_000);
    assert_eq!(h.ledger.module_balance(), 0);
    assert_eq!(h.keeper.store().next_dispute_id().unwrap(), 1);
    assert!(h.keeper.open_disputes().unwrap().is_empty());
    assert!(h.oracle.flagged().is_empty());
    assert!(h.events().is_empty());

    // The same proposal goes through once the store accepts writes again.
    assert_eq!(h.open_warning(), 1);
    assert_eq!(h.stake.stake_of(&reporter()), 99_000);
}

#[test]
fn failed_write_returns_a_bond_paid_fee() {
    let h = Harness::new();
    h.stake.add_reporter(&bob(), 50_000);
    let id = h
        .keeper
        .propose_dispute(&alice(), report(), DisputeCategory::Minor, Amount::new(500), false, &h.now())
        .unwrap();

    h.keeper.store().fail_next_batches(1);
    let err = h
        .keeper
        .add_fee_to_dispute(&bob(), id, Amount::new(4_500), true, &h.now())
        .unwrap_err();
    assert!(matches!(err, DisputeError::Store(_)));

    assert_eq!(h.stake.stake_of(&bob()), 50_000);
    assert_eq!(h.stake.stake_of(&reporter()), 100_000);
    assert_eq!(h.ledger.module_balance(), 500);
    let d = h.keeper.dispute(id).unwrap();
    assert_eq!(d.status, DisputeStatus::Prevote);
    assert_eq!(d.fee_total, Amount::new(500));
    assert!(h.keeper.fee_payer(id, &bob()).is_err());
}
