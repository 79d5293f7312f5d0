//! Property-based tests for bill splitting.

use std::collections::BTreeMap;

use cartsplit_shared::types::{MemberId, Precision, RoundingMode};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::allocation::{BillSplitter, split_by_shares, split_equally};

/// Strategy to generate a total from 0.00 to 1,000,000.00.
fn total_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a share map with at least one positive weight.
fn shares_strategy() -> impl Strategy<Value = BTreeMap<MemberId, Decimal>> {
    prop::collection::vec(0u32..1_000u32, 1..12)
        .prop_filter("at least one positive weight", |w| w.iter().any(|x| *x > 0))
        .prop_map(|weights| {
            weights
                .into_iter()
                .enumerate()
                .map(|(i, w)| (MemberId::new(format!("m{i:02}")), Decimal::from(w)))
                .collect()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Equal split sums exactly to the total and nobody is more than one cent apart.
    #[test]
    fn prop_split_equally_conserves_total(total in total_strategy(), count in 1usize..50) {
        let parts = split_equally(total, count).unwrap();
        prop_assert_eq!(parts.len(), count);
        prop_assert_eq!(parts.iter().copied().sum::<Decimal>(), total);

        let max = parts.iter().max().copied().unwrap();
        let min = parts.iter().min().copied().unwrap();
        prop_assert!(max - min <= Decimal::new(1, 2));
    }

    /// Weighted split sums exactly to the total.
    #[test]
    fn prop_split_by_shares_conserves_total(total in total_strategy(), shares in shares_strategy()) {
        let parts = split_by_shares(total, &shares).unwrap();
        prop_assert_eq!(parts.len(), shares.len());
        prop_assert_eq!(parts.values().copied().sum::<Decimal>(), total);
    }

    /// Each weighted part is within one cent of its exact proportional value.
    #[test]
    fn prop_split_by_shares_is_proportional(total in total_strategy(), shares in shares_strategy()) {
        let parts = split_by_shares(total, &shares).unwrap();
        let total_weight: Decimal = shares.values().copied().sum();
        for (member, weight) in &shares {
            let exact = total * *weight / total_weight;
            let diff = (parts[member] - exact).abs();
            prop_assert!(diff < Decimal::new(1, 2), "member {} off by {}", member, diff);
        }
    }

    /// Totals with sub-cent digits conserve their rounded value.
    #[test]
    fn prop_split_rounds_total_once(mills in 0i64..10_000_000i64, count in 1usize..20) {
        let total = Decimal::new(mills, 3);
        let splitter = BillSplitter::new(Precision::new(2, RoundingMode::HalfAwayFromZero));
        let parts = splitter.split_equally(total, count).unwrap();
        prop_assert_eq!(parts.iter().copied().sum::<Decimal>(), splitter.precision().round(total));
    }
}
