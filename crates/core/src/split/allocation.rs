//! Bill splitting using the Largest Remainder Method.
//!
//! Every split guarantees the allocations sum EXACTLY to the total rounded
//! to the minor unit (no cents lost or gained):
//! 1. Calculate exact allocations
//! 2. Truncate each to the minor unit
//! 3. Calculate the remainder (total - sum of truncated)
//! 4. Hand out remainder units one at a time, largest fractional part
//!    first, ties to the earlier member

use std::collections::BTreeMap;

use cartsplit_shared::SettlementConfig;
use cartsplit_shared::types::{MemberId, Precision};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::ValidationError;
use crate::settlement::types::checked_sum;

/// Splits totals among members at a fixed precision.
#[derive(Debug, Clone, Copy, Default)]
pub struct BillSplitter {
    precision: Precision,
}

impl BillSplitter {
    /// Creates a splitter for the given precision.
    #[must_use]
    pub const fn new(precision: Precision) -> Self {
        Self { precision }
    }

    /// Creates a splitter from the settlement configuration.
    #[must_use]
    pub const fn from_config(config: &SettlementConfig) -> Self {
        Self::new(config.precision())
    }

    /// Precision allocations are expressed in.
    #[must_use]
    pub const fn precision(&self) -> Precision {
        self.precision
    }

    /// Splits `total` equally across `member_count` members.
    ///
    /// The first members in order absorb the remainder, one unit each.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use cartsplit_core::split::BillSplitter;
    ///
    /// // 100 / 3 = [33.34, 33.33, 33.33], sum = 100.00
    /// let result = BillSplitter::default().split_equally(dec!(100), 3).unwrap();
    /// assert_eq!(result, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
    /// ```
    pub fn split_equally(
        &self,
        total: Decimal,
        member_count: usize,
    ) -> Result<Vec<Decimal>, ValidationError> {
        ensure_non_negative(total)?;
        if member_count == 0 {
            return Err(ValidationError::NoMembers);
        }

        let unit = self.precision.unit();
        let total_rounded = self.precision.round(total);
        let count = Decimal::from(member_count as u64);

        let base = self.precision.truncate(total_rounded / count);
        let remainder = total_rounded - base * count;
        let extra = self.units(remainder)?;

        debug!(%total_rounded, member_count, extra, "Split equally");
        Ok((0..member_count)
            .map(|i| if i < extra { base + unit } else { base })
            .collect())
    }

    /// Splits `total` in proportion to each member's weight.
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use rust_decimal_macros::dec;
    /// use cartsplit_core::split::BillSplitter;
    /// use cartsplit_shared::types::MemberId;
    ///
    /// let shares: BTreeMap<MemberId, _> =
    ///     [("A", dec!(1)), ("B", dec!(1)), ("C", dec!(1))]
    ///         .into_iter()
    ///         .map(|(m, w)| (MemberId::from(m), w))
    ///         .collect();
    /// let result = BillSplitter::default().split_by_shares(dec!(100), &shares).unwrap();
    /// assert_eq!(result[&MemberId::from("A")], dec!(33.34));
    /// assert_eq!(result.values().sum::<rust_decimal::Decimal>(), dec!(100));
    /// ```
    pub fn split_by_shares(
        &self,
        total: Decimal,
        shares: &BTreeMap<MemberId, Decimal>,
    ) -> Result<BTreeMap<MemberId, Decimal>, ValidationError> {
        ensure_non_negative(total)?;
        if shares.is_empty() {
            return Err(ValidationError::EmptyShares);
        }
        if let Some((member, weight)) = shares.iter().find(|(_, w)| **w < Decimal::ZERO) {
            return Err(ValidationError::NegativeWeight {
                member: member.clone(),
                weight: *weight,
            });
        }
        let total_weight = checked_sum(shares.values().copied())?;
        if total_weight.is_zero() {
            return Err(ValidationError::ZeroTotalWeight);
        }

        let unit = self.precision.unit();
        let total_rounded = self.precision.round(total);

        let exact: Vec<Decimal> = shares
            .values()
            .map(|weight| share_of(total_rounded, *weight, total_weight))
            .collect::<Result<_, _>>()?;
        let mut rounded: Vec<Decimal> = exact
            .iter()
            .map(|amount| self.precision.truncate(*amount))
            .collect();

        let sum_rounded: Decimal = rounded.iter().copied().sum();
        let units_to_distribute = self.units(total_rounded - sum_rounded)?;
        if units_to_distribute > shares.len() {
            return Err(ValidationError::UnallocatedRemainder {
                remainder: total_rounded - sum_rounded,
            });
        }

        if units_to_distribute > 0 {
            let mut remainders: Vec<(usize, Decimal)> = exact
                .iter()
                .zip(rounded.iter())
                .enumerate()
                .map(|(i, (e, r))| (i, *e - *r))
                .collect();

            // Stable sort keeps iteration order among equal remainders.
            remainders.sort_by(|a, b| b.1.cmp(&a.1));

            for (idx, _) in remainders.iter().take(units_to_distribute) {
                rounded[*idx] += unit;
            }
        }

        debug!(
            %total_rounded,
            member_count = shares.len(),
            units_to_distribute,
            "Split by shares"
        );
        Ok(shares.keys().cloned().zip(rounded).collect())
    }

    /// Whole minor units in a non-negative remainder.
    fn units(&self, remainder: Decimal) -> Result<usize, ValidationError> {
        self.precision
            .to_units(remainder)
            .and_then(|units| usize::try_from(units).ok())
            .ok_or(ValidationError::UnallocatedRemainder { remainder })
    }
}

/// `total * weight / total_weight`, multiplying first so exact quotients
/// stay exact. Falls back to dividing first when the product overflows;
/// `weight <= total_weight`, so that result never exceeds `total`.
fn share_of(total: Decimal, weight: Decimal, total_weight: Decimal) -> Result<Decimal, ValidationError> {
    match total.checked_mul(weight) {
        Some(product) => product.checked_div(total_weight),
        None => weight
            .checked_div(total_weight)
            .and_then(|ratio| total.checked_mul(ratio)),
    }
    .ok_or(ValidationError::AmountOverflow)
}

fn ensure_non_negative(amount: Decimal) -> Result<(), ValidationError> {
    if amount < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount { amount });
    }
    Ok(())
}

/// Splits `total` equally at cent precision.
///
/// # Errors
///
/// See [`BillSplitter::split_equally`].
pub fn split_equally(total: Decimal, member_count: usize) -> Result<Vec<Decimal>, ValidationError> {
    BillSplitter::default().split_equally(total, member_count)
}

/// Splits `total` by weight at cent precision.
///
/// # Errors
///
/// See [`BillSplitter::split_by_shares`].
pub fn split_by_shares(
    total: Decimal,
    shares: &BTreeMap<MemberId, Decimal>,
) -> Result<BTreeMap<MemberId, Decimal>, ValidationError> {
    BillSplitter::default().split_by_shares(total, shares)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartsplit_shared::types::RoundingMode;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn shares(entries: &[(&str, Decimal)]) -> BTreeMap<MemberId, Decimal> {
        entries
            .iter()
            .map(|(id, weight)| (MemberId::from(*id), *weight))
            .collect()
    }

    // =========================================================================
    // split_equally tests
    // =========================================================================

    #[test]
    fn test_split_equally_no_members() {
        assert_eq!(split_equally(dec!(100), 0), Err(ValidationError::NoMembers));
    }

    #[test]
    fn test_split_equally_single() {
        assert_eq!(split_equally(dec!(100), 1).unwrap(), vec![dec!(100)]);
    }

    #[test]
    fn test_split_equally_thirds() {
        let result = split_equally(dec!(100), 3).unwrap();
        // First member gets the extra cent
        assert_eq!(result, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
    }

    #[test]
    fn test_split_equally_negative_total() {
        assert_eq!(
            split_equally(dec!(-5), 2),
            Err(ValidationError::NegativeAmount { amount: dec!(-5) })
        );
    }

    #[rstest]
    #[case(dec!(100), 3)]
    #[case(dec!(100), 7)]
    #[case(dec!(1000), 3)]
    #[case(dec!(1), 3)]
    #[case(dec!(0.01), 3)]
    #[case(dec!(999.99), 7)]
    #[case(dec!(0), 4)]
    fn test_split_equally_sum_invariant(#[case] total: Decimal, #[case] count: usize) {
        let result = split_equally(total, count).unwrap();
        assert_eq!(result.len(), count);
        assert_eq!(result.iter().sum::<Decimal>(), total);
        let max = result.iter().max().unwrap();
        let min = result.iter().min().unwrap();
        assert!(*max - *min <= dec!(0.01));
    }

    #[test]
    fn test_split_equally_rounds_total_first() {
        // 10.005 rounds to 10.01 (half away from zero)
        let result = split_equally(dec!(10.005), 2).unwrap();
        assert_eq!(result, vec![dec!(5.01), dec!(5.00)]);
    }

    #[test]
    fn test_split_equally_whole_units() {
        let splitter = BillSplitter::new(Precision::new(0, RoundingMode::HalfAwayFromZero));
        assert_eq!(
            splitter.split_equally(dec!(10), 4).unwrap(),
            vec![dec!(3), dec!(3), dec!(2), dec!(2)]
        );
    }

    // =========================================================================
    // split_by_shares tests
    // =========================================================================

    #[test]
    fn test_split_by_shares_equal_weights() {
        let result = split_by_shares(dec!(100), &shares(&[("A", dec!(1)), ("B", dec!(1)), ("C", dec!(1))]))
            .unwrap();
        assert_eq!(result, shares(&[("A", dec!(33.34)), ("B", dec!(33.33)), ("C", dec!(33.33))]));
    }

    #[test]
    fn test_split_by_shares_uneven() {
        let result = split_by_shares(dec!(100), &shares(&[("A", dec!(50)), ("B", dec!(30)), ("C", dec!(20))]))
            .unwrap();
        assert_eq!(result, shares(&[("A", dec!(50)), ("B", dec!(30)), ("C", dec!(20))]));
    }

    #[test]
    fn test_split_by_shares_largest_remainder_wins() {
        // 10 * 2/3 = 6.666.., 10 * 1/3 = 3.333..; the larger fraction gets the cent.
        let result = split_by_shares(dec!(10), &shares(&[("A", dec!(1)), ("B", dec!(2))])).unwrap();
        assert_eq!(result, shares(&[("A", dec!(3.33)), ("B", dec!(6.67))]));
    }

    #[test]
    fn test_split_by_shares_zero_weight_member_gets_nothing() {
        let result = split_by_shares(dec!(10), &shares(&[("A", dec!(0)), ("B", dec!(1)), ("C", dec!(2))]))
            .unwrap();
        assert_eq!(result[&MemberId::from("A")], Decimal::ZERO);
        assert_eq!(result.values().copied().sum::<Decimal>(), dec!(10));
    }

    #[test]
    fn test_split_by_shares_errors() {
        assert_eq!(
            split_by_shares(dec!(10), &BTreeMap::new()),
            Err(ValidationError::EmptyShares)
        );
        assert_eq!(
            split_by_shares(dec!(10), &shares(&[("A", dec!(1)), ("B", dec!(-1))])),
            Err(ValidationError::NegativeWeight {
                member: MemberId::from("B"),
                weight: dec!(-1)
            })
        );
        assert_eq!(
            split_by_shares(dec!(10), &shares(&[("A", dec!(0)), ("B", dec!(0))])),
            Err(ValidationError::ZeroTotalWeight)
        );
        assert_eq!(
            split_by_shares(dec!(-10), &shares(&[("A", dec!(1))])),
            Err(ValidationError::NegativeAmount { amount: dec!(-10) })
        );
    }

    #[test]
    fn test_split_by_shares_huge_weights_do_not_overflow() {
        let total = dec!(1000000000000000);
        let result = split_by_shares(total, &shares(&[("A", total), ("B", dec!(1))])).unwrap();
        assert_eq!(result.values().copied().sum::<Decimal>(), total);
        assert!(result[&MemberId::from("A")] > result[&MemberId::from("B")]);
    }

    #[test]
    fn test_split_by_shares_weight_sum_overflow_is_an_error() {
        assert_eq!(
            split_by_shares(dec!(10), &shares(&[("A", Decimal::MAX), ("B", Decimal::MAX)])),
            Err(ValidationError::AmountOverflow)
        );
    }

    #[test]
    fn test_negative_remainder_is_not_silently_dropped() {
        let splitter = BillSplitter::default();
        assert_eq!(splitter.units(dec!(0.03)), Ok(3));
        assert_eq!(
            splitter.units(dec!(-0.01)),
            Err(ValidationError::UnallocatedRemainder { remainder: dec!(-0.01) })
        );
    }

    #[rstest]
    #[case(dec!(100), vec![dec!(33.33), dec!(33.33), dec!(33.34)])]
    #[case(dec!(1000), vec![dec!(25), dec!(25), dec!(25), dec!(25)])]
    #[case(dec!(99.99), vec![dec!(10), dec!(20), dec!(30), dec!(40)])]
    #[case(dec!(0.05), vec![dec!(1), dec!(1), dec!(1), dec!(1), dec!(1), dec!(1), dec!(1)])]
    fn test_split_by_shares_sum_invariant(#[case] total: Decimal, #[case] weights: Vec<Decimal>) {
        let map: BTreeMap<MemberId, Decimal> = weights
            .iter()
            .enumerate()
            .map(|(i, w)| (MemberId::new(format!("m{i}")), *w))
            .collect();
        let result = split_by_shares(total, &map).unwrap();
        assert_eq!(result.values().copied().sum::<Decimal>(), total);
    }
}
