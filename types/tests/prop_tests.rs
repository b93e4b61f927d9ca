use proptest::prelude::*;

use layer_types::{
    AccountAddress, Amount, DisputeCategory, DisputeParams, HashId, MicroReport, Timestamp,
    VoteResult,
};

fn category() -> impl Strategy<Value = DisputeCategory> {
    prop_oneof![
        Just(DisputeCategory::Warning),
        Just(DisputeCategory::Minor),
        Just(DisputeCategory::Major),
    ]
}

proptest! {
    /// HashId::is_zero is true only for all-zero bytes.
    #[test]
    fn hash_id_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let hash = HashId::new(bytes);
        prop_assert_eq!(hash.is_zero(), bytes == [0u8; 32]);
    }

    /// Hex display is always 64 lowercase characters.
    #[test]
    fn hash_id_hex_shape(bytes in prop::array::uniform32(0u8..)) {
        let hex = HashId::new(bytes).to_hex();
        prop_assert_eq!(hex.len(), 64);
        prop_assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta.is_before(tb), a < b);
    }

    /// The category fee never exceeds the stake it is computed from.
    #[test]
    fn category_fee_bounded_by_stake(stake in 0u128..10u128.pow(30), cat in category()) {
        let fee = Amount::new(stake).percent(cat.slash_percent()).unwrap();
        prop_assert!(fee <= Amount::new(stake));
    }

    /// Different categories of the same report never share a lineage hash.
    #[test]
    fn lineage_hash_separates_categories(power in 0u64..1_000_000, ts in 0u64..2_000_000_000) {
        let report = MicroReport {
            reporter: AccountAddress::new("tellor1prop"),
            power,
            query_type: "SpotPrice".into(),
            query_id: vec![1, 2, 3],
            aggregate_method: "weighted-median".into(),
            value: "ff".into(),
            timestamp: Timestamp::new(ts),
            cyclelist: false,
            block_number: 1,
        };
        let warning = report.hash_id(DisputeCategory::Warning).unwrap();
        let major = report.hash_id(DisputeCategory::Major).unwrap();
        prop_assert_ne!(warning, major);
    }
}

#[test]
fn vote_result_defaults_to_no_tally() {
    assert_eq!(VoteResult::default(), VoteResult::NoTally);
}

#[test]
fn params_from_partial_json() {
    let params: DisputeParams =
        serde_json::from_str(r#"{"team_address":"tellor1team","minor_jail_secs":60}"#).unwrap();
    assert_eq!(params.minor_jail_secs, 60);
    assert_eq!(params.min_dispute_fee, Amount::new(10_000));
    assert_eq!(
        params.team_address,
        Some(AccountAddress::new("tellor1team"))
    );
}
