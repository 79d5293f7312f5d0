//! Minor-unit precision and rounding for monetary amounts.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` values in a single implied currency;
//! this module decides how they snap to the minor unit (e.g. cents).

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// How a value is rounded to the minor unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// 0.005 -> 0.01, -0.005 -> -0.01.
    #[default]
    HalfAwayFromZero,
    /// Banker's rounding: 0.005 -> 0.00, 0.015 -> 0.02.
    HalfEven,
}

impl RoundingMode {
    const fn strategy(self) -> RoundingStrategy {
        match self {
            Self::HalfAwayFromZero => RoundingStrategy::MidpointAwayFromZero,
            Self::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

impl std::str::FromStr for RoundingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "half_away_from_zero" => Ok(Self::HalfAwayFromZero),
            "half_even" => Ok(Self::HalfEven),
            _ => Err(format!("Unknown rounding mode: {s}")),
        }
    }
}

/// Precision of the implied currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precision {
    /// Number of decimal places in one minor unit (2 for cents).
    pub decimal_places: u32,
    /// Rounding applied when snapping to the minor unit.
    pub rounding: RoundingMode,
}

impl Default for Precision {
    fn default() -> Self {
        Self::CENTS
    }
}

impl Precision {
    /// Two decimal places, half away from zero.
    pub const CENTS: Self = Self {
        decimal_places: 2,
        rounding: RoundingMode::HalfAwayFromZero,
    };

    /// Most decimal places a `Decimal` can carry.
    pub const MAX_DECIMAL_PLACES: u32 = 28;

    /// Creates a precision with the given decimal places and rounding mode.
    ///
    /// Decimal places above [`Self::MAX_DECIMAL_PLACES`] are clamped.
    #[must_use]
    pub const fn new(decimal_places: u32, rounding: RoundingMode) -> Self {
        let decimal_places = if decimal_places > Self::MAX_DECIMAL_PLACES {
            Self::MAX_DECIMAL_PLACES
        } else {
            decimal_places
        };
        Self {
            decimal_places,
            rounding,
        }
    }

    /// The smallest representable amount, e.g. `0.01`.
    #[must_use]
    pub fn unit(self) -> Decimal {
        Decimal::new(1, self.decimal_places.min(Self::MAX_DECIMAL_PLACES))
    }

    /// Rounds `amount` to the minor unit using the configured mode.
    #[must_use]
    pub fn round(self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.decimal_places, self.rounding.strategy())
    }

    /// Truncates `amount` to the minor unit (toward zero).
    #[must_use]
    pub fn truncate(self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.decimal_places, RoundingStrategy::ToZero)
    }

    /// Returns true if `amount` has no digits below the minor unit.
    #[must_use]
    pub fn is_exact(self, amount: Decimal) -> bool {
        self.truncate(amount) == amount
    }

    /// Converts an amount to a whole number of minor units, truncating.
    ///
    /// Returns `None` if the count does not fit in a `u64` or is negative.
    #[must_use]
    pub fn to_units(self, amount: Decimal) -> Option<u64> {
        use rust_decimal::prelude::ToPrimitive;

        (self.truncate(amount) / self.unit()).trunc().to_u64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_cents_unit() {
        assert_eq!(Precision::CENTS.unit(), dec!(0.01));
        assert_eq!(Precision::new(0, RoundingMode::HalfEven).unit(), dec!(1));
        assert_eq!(Precision::new(3, RoundingMode::HalfEven).unit(), dec!(0.001));
    }

    #[test]
    fn test_decimal_places_clamped_to_decimal_scale() {
        let precision = Precision::new(40, RoundingMode::HalfEven);
        assert_eq!(precision.decimal_places, Precision::MAX_DECIMAL_PLACES);
        assert_eq!(precision.unit(), Decimal::new(1, 28));

        // Built directly, bypassing `new`.
        let unchecked = Precision {
            decimal_places: 40,
            rounding: RoundingMode::HalfAwayFromZero,
        };
        assert_eq!(unchecked.unit(), Decimal::new(1, 28));
    }

    #[rstest]
    #[case(dec!(0.005), dec!(0.01))]
    #[case(dec!(-0.005), dec!(-0.01))]
    #[case(dec!(0.015), dec!(0.02))]
    #[case(dec!(2.344), dec!(2.34))]
    #[case(dec!(15.75), dec!(15.75))]
    fn test_round_half_away_from_zero(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(Precision::CENTS.round(input), expected);
    }

    #[rstest]
    #[case(dec!(0.005), dec!(0.00))]
    #[case(dec!(0.015), dec!(0.02))]
    #[case(dec!(0.025), dec!(0.02))]
    #[case(dec!(-0.025), dec!(-0.02))]
    fn test_round_half_even(#[case] input: Decimal, #[case] expected: Decimal) {
        let precision = Precision::new(2, RoundingMode::HalfEven);
        assert_eq!(precision.round(input), expected);
    }

    #[test]
    fn test_truncate_goes_toward_zero() {
        assert_eq!(Precision::CENTS.truncate(dec!(33.3333)), dec!(33.33));
        assert_eq!(Precision::CENTS.truncate(dec!(-33.3399)), dec!(-33.33));
    }

    #[test]
    fn test_is_exact() {
        assert!(Precision::CENTS.is_exact(dec!(10.25)));
        assert!(Precision::CENTS.is_exact(dec!(10)));
        assert!(!Precision::CENTS.is_exact(dec!(10.251)));
    }

    #[test]
    fn test_to_units() {
        assert_eq!(Precision::CENTS.to_units(dec!(0.03)), Some(3));
        assert_eq!(Precision::CENTS.to_units(dec!(1.009)), Some(100));
        assert_eq!(Precision::CENTS.to_units(dec!(0)), Some(0));
        assert_eq!(Precision::CENTS.to_units(dec!(-0.02)), None);
    }

    #[test]
    fn test_rounding_mode_from_str() {
        assert_eq!(
            RoundingMode::from_str("half_away_from_zero").unwrap(),
            RoundingMode::HalfAwayFromZero
        );
        assert_eq!(RoundingMode::from_str("HALF_EVEN").unwrap(), RoundingMode::HalfEven);
        assert!(RoundingMode::from_str("up").is_err());
    }

    #[test]
    fn test_rounding_mode_serde() {
        assert_eq!(
            serde_json::to_string(&RoundingMode::HalfEven).unwrap(),
            "\"half_even\""
        );
        let mode: RoundingMode = serde_json::from_str("\"half_away_from_zero\"").unwrap();
        assert_eq!(mode, RoundingMode::HalfAwayFromZero);
    }
}
