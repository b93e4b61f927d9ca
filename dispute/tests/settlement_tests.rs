//! Execution, fee refunds, voter rewards and round escalation.

mod common;

use common::*;
use layer_dispute::{DisputeError, DisputeEvent, Share, TallyOutcome};
use layer_types::{Amount, DisputeCategory, DisputeStatus, VoteChoice, VoteResult};

/// Opens a warning dispute and lets the default world decide it `choice`.
/// Voting stops at the first ballot that produces a majority.
fn decided(choice: VoteChoice) -> (Harness, u64) {
    let h = Harness::new();
    let id = h.open_warning();
    for (voter, c) in [
        (tipper(), VoteChoice::Against),
        (reporter(), VoteChoice::Against),
        (user(), choice),
        (reporter_a(), choice),
    ] {
        if let TallyOutcome::Decided { .. } = h.keeper.vote(&voter, id, c, &h.now()).unwrap() {
            break;
        }
    }
    assert_eq!(h.next_block().executed, vec![id]);
    (h, id)
}

#[test]
fn supported_dispute_pays_fee_payers_the_bond() {
    let (h, id) = decided(VoteChoice::Support);

    let d = h.keeper.dispute(id).unwrap();
    assert_eq!(d.voter_reward, Amount::new(25));
    assert_eq!(h.ledger.burned(), 25);
    assert_eq!(h.stake.stake_of(&reporter()), 99_000);

    let paid = h.keeper.withdraw_fee_refund(&alice(), id).unwrap();
    assert_eq!(paid, Amount::new(1_950));
    assert_eq!(h.ledger.account_balance(&alice()), 950);
    assert_eq!(h.stake.stake_of(&alice()), 1_000);
    assert_eq!(h.ledger.module_balance(), 25);

    assert!(h.events().iter().any(|e| matches!(
        e,
        DisputeEvent::FeeRefunded { refund, bond_reward, .. }
            if *refund == Amount::new(950) && *bond_reward == Amount::new(1_000)
    )));
}

#[test]
fn invalid_dispute_returns_the_slash() {
    let (h, id) = decided(VoteChoice::Invalid);

    assert_eq!(h.stake.stake_of(&reporter()), 100_000);
    assert_eq!(h.ledger.module_balance(), 975);
    assert_eq!(h.keeper.withdraw_fee_refund(&alice(), id).unwrap(), Amount::new(950));
    assert_eq!(h.ledger.module_balance(), 25);
}

#[test]
fn rejected_dispute_pays_the_reporter_and_keeps_fees() {
    let (h, id) = decided(VoteChoice::Against);

    assert_eq!(h.stake.stake_of(&reporter()), 99_000 + 1_000 + 950);
    assert_eq!(h.ledger.module_balance(), 25);
    let err = h.keeper.withdraw_fee_refund(&alice(), id).unwrap_err();
    assert!(matches!(err, DisputeError::InvalidState(_)));
}

#[test]
fn execution_happens_once() {
    let (h, id) = decided(VoteChoice::Support);
    let err = h.keeper.execute_vote(id, &h.now()).unwrap_err();
    assert!(matches!(err, DisputeError::AlreadyDone(_)));
    assert_eq!(h.ledger.burned(), 25);
    assert!(h.next_block().is_empty());
}

#[test]
fn refunds_wait_for_execution() {
    let h = Harness::new();
    let id = h.open_warning();
    let err = h.keeper.withdraw_fee_refund(&alice(), id).unwrap_err();
    assert!(matches!(err, DisputeError::InvalidState(_)));

    h.vote(&user(), id, VoteChoice::Invalid);
    h.vote(&reporter_a(), id, VoteChoice::Invalid);
    let err = h.keeper.withdraw_fee_refund(&alice(), id).unwrap_err();
    assert!(matches!(err, DisputeError::InvalidState(_)));
    let err = h.keeper.claim_reward(&user(), id).unwrap_err();
    assert!(matches!(err, DisputeError::InvalidState(_)));
}

#[test]
fn voters_claim_pro_rata_rewards_once() {
    let (h, id) = decided(VoteChoice::Support);
    h.keeper.withdraw_fee_refund(&alice(), id).unwrap();

    assert_eq!(h.keeper.claim_reward(&user(), id).unwrap(), Amount::new(14));
    assert_eq!(h.keeper.claim_reward(&reporter_a(), id).unwrap(), Amount::new(6));
    assert_eq!(h.keeper.claim_reward(&tipper(), id).unwrap(), Amount::new(2));
    assert_eq!(h.keeper.claim_reward(&reporter(), id).unwrap(), Amount::new(2));

    assert_eq!(h.ledger.account_balance(&user()), 1_212_000 + 14);
    assert_eq!(h.keeper.dust().unwrap(), 999_999);
    assert_eq!(h.ledger.module_balance(), 1);

    let twice = h.keeper.claim_reward(&user(), id).unwrap_err();
    assert!(matches!(twice, DisputeError::AlreadyDone(_)));
    let stranger = h.keeper.claim_reward(&bob(), id).unwrap_err();
    assert!(matches!(stranger, DisputeError::NotFound { .. }));
}

#[test]
fn unresolved_dispute_escalates_with_a_doubled_burn() {
    let h = Harness::new();
    let first = h.open_warning();
    h.vote(&tipper(), first, VoteChoice::Against);
    h.close_ballot();
    assert_eq!(h.keeper.dispute(first).unwrap().status, DisputeStatus::Unresolved);

    let too_cheap = h
        .keeper
        .propose_dispute(&bob(), report(), DisputeCategory::Warning, Amount::new(49), false, &h.now())
        .unwrap_err();
    assert!(matches!(too_cheap, DisputeError::InvalidFee(_)));

    let second = h
        .keeper
        .propose_dispute(&bob(), report(), DisputeCategory::Warning, Amount::new(50), false, &h.now())
        .unwrap();
    assert_eq!(second, 2);
    assert_eq!(h.ledger.account_balance(&bob()), 1_950);

    let prev = h.keeper.dispute(first).unwrap();
    assert!(!prev.open);
    let d = h.keeper.dispute(second).unwrap();
    assert_eq!(d.round, 2);
    assert_eq!(d.status, DisputeStatus::Voting);
    assert_eq!(d.burn_amount, Amount::new(100));
    assert_eq!(d.fee_total, Amount::new(1_000));
    assert_eq!(d.prev_dispute_ids, vec![1, 2]);
    assert_eq!(h.keeper.open_disputes().unwrap(), vec![second]);
    assert!(h
        .events()
        .iter()
        .any(|e| matches!(e, DisputeEvent::RoundAdded { dispute_id: 2, previous_id: 1, round: 2, .. })));

    h.vote(&user(), second, VoteChoice::Support);
    h.vote(&reporter_a(), second, VoteChoice::Support);
    assert_eq!(h.next_block().executed, vec![second]);

    let d = h.keeper.dispute(second).unwrap();
    assert_eq!(d.voter_reward, Amount::new(50));
    assert_eq!(h.ledger.burned(), 50);

    // Refunds and rewards resolve the latest round from any id of the lineage.
    assert_eq!(h.keeper.withdraw_fee_refund(&alice(), first).unwrap(), Amount::new(1_950));
    let round_payer = h.keeper.withdraw_fee_refund(&bob(), second).unwrap_err();
    assert!(matches!(round_payer, DisputeError::NotFound { .. }));

    assert_eq!(h.keeper.claim_reward(&tipper(), first).unwrap(), Amount::new(4));
    assert_eq!(h.keeper.claim_reward(&user(), second).unwrap(), Amount::new(29));
    assert_eq!(h.keeper.claim_reward(&reporter_a(), second).unwrap(), Amount::new(16));
    assert_eq!(h.ledger.module_balance(), 1);
}

#[test]
fn rounds_stop_once_the_burn_reaches_the_slash() {
    let h = Harness::new();
    let mut id = h.open_warning();
    let mut burn = 50u128;

    while burn < 1_000 {
        let block_report = h.close_ballot();
        assert_eq!(block_report.tallied, vec![id]);
        assert_eq!(h.keeper.dispute(id).unwrap().status, DisputeStatus::Unresolved);
        id = h
            .keeper
            .propose_dispute(&bob(), report(), DisputeCategory::Warning, Amount::new(burn), false, &h.now())
            .unwrap();
        burn *= 2;
        assert_eq!(h.keeper.dispute(id).unwrap().burn_amount, Amount::new(burn));
    }
    assert_eq!(id, 6);
    assert_eq!(h.ledger.account_balance(&bob()), 2_000 - 1_550);

    // Burn 1 600 covers the slash: the silent last round settles at once.
    let block_report = h.close_ballot();
    assert_eq!(block_report.tallied, vec![6]);
    assert_eq!(block_report.executed, vec![6]);
    assert_eq!(h.keeper.vote_info(6).unwrap().result, VoteResult::NoQuorumMajorityInvalid);
    assert_eq!(h.ledger.burned(), 1_600);
    assert_eq!(h.stake.stake_of(&reporter()), 100_000);

    assert_eq!(h.keeper.withdraw_fee_refund(&alice(), 1).unwrap(), Amount::new(950));
    assert_eq!(h.ledger.module_balance(), 0);

    let closed = h
        .keeper
        .propose_dispute(&bob(), report(), DisputeCategory::Warning, Amount::new(1_600), false, &h.now())
        .unwrap_err();
    assert!(matches!(closed, DisputeError::InvalidState(_)));
}

#[test]
fn escalation_closes_with_the_grace_period() {
    let h = Harness::new();
    h.open_warning();
    h.close_ballot();
    let block = h.clock.advance(DAY_SECS);
    let err = h
        .keeper
        .propose_dispute(&bob(), report(), DisputeCategory::Warning, Amount::new(50), false, &block)
        .unwrap_err();
    assert!(matches!(err, DisputeError::InvalidState(_)));
}

/// Round one ends unresolved on a lone tipper ballot; bob pays the round fee.
fn escalated() -> (Harness, u64, u64) {
    let h = Harness::new();
    let first = h.open_warning();
    h.vote(&tipper(), first, VoteChoice::Against);
    h.close_ballot();
    let second = h
        .keeper
        .propose_dispute(&bob(), report(), DisputeCategory::Warning, Amount::new(50), false, &h.now())
        .unwrap();
    (h, first, second)
}

#[test]
fn voter_in_two_rounds_is_rewarded_for_both_ballots() {
    let (h, first, second) = escalated();
    h.vote(&tipper(), second, VoteChoice::Against);
    h.vote(&user(), second, VoteChoice::Support);
    h.vote(&reporter_a(), second, VoteChoice::Support);
    assert_eq!(h.next_block().executed, vec![second]);

    assert_eq!(h.keeper.sum_of_all_group_votes_all_rounds(first).unwrap(), 100);
    // tipper 100 + user 300 tips and 1 212 000 tokens + reporter_a 300 000.
    assert_eq!(h.keeper.vote_counts(second).unwrap().total(), 1_512_400);
    assert_eq!(
        h.keeper.sum_of_all_group_votes_all_rounds(second).unwrap(),
        1_512_500
    );

    // Users total 500 across rounds, tipper cast 200 of it: 0.4 of one of
    // three rewarded classes, applied to a reward of 50.
    assert_eq!(h.keeper.dispute(second).unwrap().voter_reward, Amount::new(50));
    let share = h.keeper.calculate_reward(&tipper(), second).unwrap();
    assert_eq!(
        share,
        Share {
            amount: Amount::new(6),
            dust: 666_666,
        }
    );

    assert_eq!(h.keeper.claim_reward(&tipper(), first).unwrap(), Amount::new(6));
    assert_eq!(h.keeper.dust().unwrap(), 666_666);
    assert!(h.keeper.voter_info(first, &tipper()).unwrap().reward_claimed);
    assert!(h.keeper.voter_info(second, &tipper()).unwrap().reward_claimed);
    let twice = h.keeper.claim_reward(&tipper(), second).unwrap_err();
    assert!(matches!(twice, DisputeError::AlreadyDone(_)));
}

#[test]
fn rejected_escalation_pays_the_reporter_slash_and_first_round_fees() {
    let (h, first, second) = escalated();
    h.vote(&user(), second, VoteChoice::Against);
    h.vote(&reporter_a(), second, VoteChoice::Against);
    assert_eq!(h.next_block().executed, vec![second]);
    assert_eq!(
        h.keeper.vote_info(second).unwrap().result.outcome(),
        Some(VoteChoice::Against)
    );

    // Slash 1 000 plus the first-round fee pot of 1 000 less its 5% burn.
    // Bob's round fee only funds the doubled burn.
    assert_eq!(h.stake.stake_of(&reporter()), 99_000 + 1_000 + 950);
    assert_eq!(h.ledger.burned(), 50);
    assert_eq!(h.keeper.dispute(second).unwrap().voter_reward, Amount::new(50));
    assert_eq!(h.ledger.module_balance(), 50);

    let alice_refund = h.keeper.withdraw_fee_refund(&alice(), first).unwrap_err();
    assert!(matches!(alice_refund, DisputeError::InvalidState(_)));
    let bob_refund = h.keeper.withdraw_fee_refund(&bob(), second).unwrap_err();
    assert!(matches!(bob_refund, DisputeError::NotFound { .. }));
}
