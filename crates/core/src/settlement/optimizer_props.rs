//! Property-based tests for settlement planning.

use cartsplit_shared::types::MemberId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::optimizer::optimize_settlement;
use super::types::BalanceMap;

/// Strategy to generate a zero-sum balance map at cent precision.
///
/// The last member absorbs the negated sum of the others.
fn zero_sum_balances() -> impl Strategy<Value = BalanceMap> {
    zero_sum_balances_at_scale(2)
}

/// Strategy to generate a zero-sum balance map with three decimal places,
/// so individual balances fall between cents.
fn sub_cent_zero_sum_balances() -> impl Strategy<Value = BalanceMap> {
    zero_sum_balances_at_scale(3)
}

fn zero_sum_balances_at_scale(scale: u32) -> impl Strategy<Value = BalanceMap> {
    prop::collection::vec(-1_000_000i64..1_000_000i64, 1..40).prop_map(move |units| {
        let mut balances: BalanceMap = units
            .iter()
            .enumerate()
            .map(|(i, u)| (MemberId::new(format!("m{i:02}")), Decimal::new(*u, scale)))
            .collect();
        let sum = balances.total().unwrap();
        balances
            .debit(&MemberId::new(format!("m{:02}", units.len())), sum)
            .unwrap();
        balances
    })
}

fn non_zero_count(balances: &BalanceMap) -> usize {
    balances.iter().filter(|(_, b)| !b.is_zero()).count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Replaying the transfers reproduces the non-zero balances exactly.
    #[test]
    fn prop_settlement_roundtrip(balances in zero_sum_balances()) {
        let transfers = optimize_settlement(&balances).unwrap();
        prop_assert_eq!(BalanceMap::replay(&transfers).unwrap(), balances.without_zeros());
    }

    /// Applying the transfers to the balances zeroes everyone.
    #[test]
    fn prop_settlement_zeroes_balances(balances in zero_sum_balances()) {
        let transfers = optimize_settlement(&balances).unwrap();
        let mut ledger = balances.clone();
        for transfer in &transfers {
            ledger.apply(transfer).unwrap();
        }
        prop_assert!(ledger.is_settled());
    }

    /// At most n - 1 transfers for n non-zero members.
    #[test]
    fn prop_transfer_bound(balances in zero_sum_balances()) {
        let transfers = optimize_settlement(&balances).unwrap();
        let n = non_zero_count(&balances);
        prop_assert!(transfers.len() <= n.saturating_sub(1));
    }

    /// Every transfer is strictly positive and goes debtor -> creditor.
    #[test]
    fn prop_transfers_are_positive_and_directed(balances in zero_sum_balances()) {
        let transfers = optimize_settlement(&balances).unwrap();
        for transfer in &transfers {
            prop_assert!(transfer.amount > Decimal::ZERO);
            prop_assert!(balances.get(&transfer.from) < Decimal::ZERO);
            prop_assert!(balances.get(&transfer.to) > Decimal::ZERO);
        }
    }

    /// Same input, same output, same order.
    #[test]
    fn prop_deterministic(balances in zero_sum_balances()) {
        let first = optimize_settlement(&balances).unwrap();
        let second = optimize_settlement(&balances.clone()).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Maps that miss zero by more than a cent are rejected.
    #[test]
    fn prop_unbalanced_rejected(
        balances in zero_sum_balances(),
        drift in 2i64..100_000i64,
        negative in any::<bool>(),
    ) {
        let mut skewed = balances;
        let drift = Decimal::new(if negative { -drift } else { drift }, 2);
        skewed.credit(&MemberId::from("m00"), drift).unwrap();
        prop_assert!(optimize_settlement(&skewed).is_err());
    }

    /// Sub-cent balances: every member's settled amount stays within one
    /// cent of what they actually owe or are owed.
    #[test]
    fn prop_sub_cent_roundtrip_within_one_unit(balances in sub_cent_zero_sum_balances()) {
        let transfers = optimize_settlement(&balances).unwrap();
        let replayed = BalanceMap::replay(&transfers).unwrap();
        for (member, balance) in &balances {
            let error = (replayed.get(member) - *balance).abs();
            prop_assert!(error <= Decimal::new(1, 2), "{} off by {}", member, error);
        }
        for (member, _) in &replayed {
            prop_assert!(balances.iter().any(|(m, _)| m == member));
        }
    }

    /// Sub-cent balances still settle in at most n - 1 positive transfers.
    #[test]
    fn prop_sub_cent_transfer_bound(balances in sub_cent_zero_sum_balances()) {
        let transfers = optimize_settlement(&balances).unwrap();
        let n = non_zero_count(&balances);
        prop_assert!(transfers.len() <= n.saturating_sub(1));
        prop_assert!(transfers.iter().all(|t| t.amount > Decimal::ZERO));
    }

    /// Sub-cent balances that net to exactly zero settle with no residual.
    #[test]
    fn prop_sub_cent_transfers_balance(balances in sub_cent_zero_sum_balances()) {
        let transfers = optimize_settlement(&balances).unwrap();
        let replayed = BalanceMap::replay(&transfers).unwrap();
        prop_assert_eq!(replayed.total().unwrap(), Decimal::ZERO);
    }
}
