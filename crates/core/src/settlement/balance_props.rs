//! Property-based tests for balance aggregation.

use cartsplit_shared::types::{GroupId, MemberId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::compute_balances;
use super::types::Payment;

/// Strategy to generate a non-negative amount from 0.00 to 10,000.00.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a payment between two of eight members.
fn payment_strategy() -> impl Strategy<Value = Payment> {
    (0u8..8, 0u8..8, amount_strategy()).prop_map(|(from, to, amount)| {
        Payment::pending(
            GroupId::from("group"),
            MemberId::new(format!("m{from}")),
            MemberId::new(format!("m{to}")),
            amount,
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Balances always net to exactly zero.
    #[test]
    fn prop_conservation(payments in prop::collection::vec(payment_strategy(), 0..40)) {
        let balances = compute_balances(&payments).unwrap();
        prop_assert_eq!(balances.total().unwrap(), Decimal::ZERO);
    }

    /// Reordering payments never changes the result.
    #[test]
    fn prop_order_independent(
        payments in prop::collection::vec(payment_strategy(), 0..40),
        seed in any::<u64>(),
    ) {
        let forward = compute_balances(&payments).unwrap();

        let mut shuffled = payments.clone();
        let len = shuffled.len();
        if len > 1 {
            // Deterministic rotation plus reversal; enough to break ordering.
            let pivot = usize::try_from(seed % len as u64).unwrap();
            shuffled.rotate_left(pivot);
            shuffled.reverse();
        }
        let backward = compute_balances(&shuffled).unwrap();
        prop_assert_eq!(forward, backward);
    }

    /// Every member that appears in a payment appears in the balance map.
    #[test]
    fn prop_every_participant_tracked(payments in prop::collection::vec(payment_strategy(), 1..40)) {
        let balances = compute_balances(&payments).unwrap();
        for payment in &payments {
            prop_assert!(balances.iter().any(|(member, _)| member == &payment.from));
            prop_assert!(balances.iter().any(|(member, _)| member == &payment.to));
        }
    }
}
