//! Greedy debt-settlement planning.
//!
//! # Algorithm
//!
//! 1. Reject balance maps that do not net to zero (within tolerance)
//! 2. Round every balance to the minor unit, then reconcile the rounded
//!    balances with the rounded sum (largest rounding error first)
//! 3. Split members into creditors and debtors, largest first, ties by ID
//! 4. Repeatedly pay `min(debt, claim)` from the current debtor to the
//!    current creditor, moving past whichever side hits zero
//!
//! Each step retires at least one member, so `n` non-zero members settle in
//! at most `n - 1` transfers. This is not a global minimum (that problem is
//! NP-hard); it is the usual greedy approximation.
//!
//! ```text
//! Balances:   A: -10.00   B: +4.00   C: +6.00
//! Creditors:  C (6.00), B (4.00)
//! Debtors:    A (10.00)
//! Transfers:  A -> C 6.00
//!             A -> B 4.00
//! ```

use cartsplit_shared::SettlementConfig;
use cartsplit_shared::types::{MemberId, Precision};
use rust_decimal::Decimal;
use rust_decimal::prelude::Signed;
use tracing::{debug, warn};

use super::types::{BalanceMap, Transfer, checked_sum};
use crate::error::ValidationError;

/// One side's outstanding amount, always positive while in play.
#[derive(Debug)]
struct Position {
    member: MemberId,
    remaining: Decimal,
}

/// Settlement optimizer with configurable precision and tolerance.
#[derive(Debug, Clone, Copy)]
pub struct SettlementOptimizer {
    precision: Precision,
    tolerance: Decimal,
}

impl Default for SettlementOptimizer {
    fn default() -> Self {
        Self::new(Precision::CENTS, Precision::CENTS.unit())
    }
}

impl SettlementOptimizer {
    /// Creates an optimizer.
    ///
    /// `tolerance` is the largest absolute balance sum accepted as "zero".
    #[must_use]
    pub const fn new(precision: Precision, tolerance: Decimal) -> Self {
        Self {
            precision,
            tolerance,
        }
    }

    /// Creates an optimizer from the settlement configuration.
    #[must_use]
    pub fn from_config(config: &SettlementConfig) -> Self {
        Self::new(config.precision(), config.tolerance())
    }

    /// Precision transfers are rounded to.
    #[must_use]
    pub const fn precision(&self) -> Precision {
        self.precision
    }

    /// Computes the transfers that bring every balance to zero.
    ///
    /// Output is deterministic for a given balance map. Rounding residue is
    /// folded into the last transfer rather than dropped.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnbalancedBalances` if the balances do not
    /// net to zero within tolerance, or if the residual left after rounding
    /// exceeds the tolerance or has no transfer to absorb it. Returns
    /// `ValidationError::AmountOverflow` if the balances cannot be summed.
    pub fn optimize(&self, balances: &BalanceMap) -> Result<Vec<Transfer>, ValidationError> {
        let sum = balances.total()?;
        if sum.abs() > self.tolerance {
            warn!(%sum, tolerance = %self.tolerance, "Refusing to settle unbalanced balance map");
            return Err(ValidationError::UnbalancedBalances {
                sum,
                tolerance: self.tolerance,
            });
        }

        let rounded = self.reconcile(balances, sum)?;
        let (mut creditors, mut debtors) = partition(rounded);
        let member_count = creditors.len() + debtors.len();
        let mut transfers = Vec::with_capacity(member_count.saturating_sub(1));

        let (mut ci, mut di) = (0, 0);
        while ci < creditors.len() && di < debtors.len() {
            let creditor = &mut creditors[ci];
            let debtor = &mut debtors[di];

            let amount = creditor.remaining.min(debtor.remaining);
            transfers.push(Transfer::new(
                debtor.member.clone(),
                creditor.member.clone(),
                amount,
            ));

            creditor.remaining -= amount;
            debtor.remaining -= amount;
            if creditor.remaining.is_zero() {
                ci += 1;
            }
            if debtor.remaining.is_zero() {
                di += 1;
            }
        }

        // Only one side can be left over; its total is the rounded input sum.
        let residual = checked_sum(
            creditors[ci..]
                .iter()
                .chain(&debtors[di..])
                .map(|position| position.remaining),
        )?;
        if residual > self.tolerance {
            warn!(%residual, tolerance = %self.tolerance, "Rounding residual exceeds tolerance");
            return Err(ValidationError::UnbalancedBalances {
                sum,
                tolerance: self.tolerance,
            });
        }
        if !residual.is_zero() {
            let Some(last) = transfers.last_mut() else {
                warn!(%residual, "No transfer left to absorb rounding residual");
                return Err(ValidationError::UnbalancedBalances {
                    sum,
                    tolerance: self.tolerance,
                });
            };
            warn!(
                %residual,
                from = %last.from,
                to = %last.to,
                "Absorbing rounding residual into final transfer"
            );
            last.amount += residual;
        }

        debug!(
            member_count,
            transfer_count = transfers.len(),
            "Computed settlement plan"
        );
        Ok(transfers)
    }

    /// Rounds every balance to the minor unit, then moves the members with
    /// the largest rounding error one unit back until the rounded balances
    /// add up to the rounded `sum`. Ties go to the earlier member.
    ///
    /// Every reconciled balance stays within one unit of the original.
    fn reconcile(
        &self,
        balances: &BalanceMap,
        sum: Decimal,
    ) -> Result<Vec<(MemberId, Decimal)>, ValidationError> {
        let mut rounded: Vec<(MemberId, Decimal)> = balances
            .iter()
            .map(|(member, balance)| (member.clone(), self.precision.round(*balance)))
            .collect();

        let drift = checked_sum(rounded.iter().map(|(_, amount)| *amount))?
            .checked_sub(self.precision.round(sum))
            .ok_or(ValidationError::AmountOverflow)?;
        if drift.is_zero() {
            return Ok(rounded);
        }

        let units = self
            .precision
            .to_units(drift.abs())
            .and_then(|units| usize::try_from(units).ok())
            .ok_or(ValidationError::AmountOverflow)?;
        let direction = drift.signum();
        let step = -direction * self.precision.unit();

        // Rounding error measured in the direction of the drift.
        let mut errors: Vec<(usize, Decimal)> = rounded
            .iter()
            .zip(balances.iter())
            .enumerate()
            .map(|(i, ((_, amount), (_, balance)))| (i, (*amount - *balance) * direction))
            .collect();
        // Stable sort keeps member order among equal errors.
        errors.sort_by(|a, b| b.1.cmp(&a.1));

        for (idx, _) in errors.iter().take(units) {
            let amount = &mut rounded[*idx].1;
            *amount = amount
                .checked_add(step)
                .ok_or(ValidationError::AmountOverflow)?;
        }

        debug!(%drift, units, "Reconciled rounded balances");
        Ok(rounded)
    }
}

/// Splits rounded balances into (creditors, debtors), each sorted by
/// descending magnitude then ascending member ID. Zeros are dropped.
fn partition(balances: Vec<(MemberId, Decimal)>) -> (Vec<Position>, Vec<Position>) {
    let mut creditors = Vec::new();
    let mut debtors = Vec::new();

    for (member, balance) in balances {
        if balance > Decimal::ZERO {
            creditors.push(Position {
                member,
                remaining: balance,
            });
        } else if balance < Decimal::ZERO {
            debtors.push(Position {
                member,
                remaining: -balance,
            });
        }
    }

    let by_magnitude = |a: &Position, b: &Position| {
        b.remaining
            .cmp(&a.remaining)
            .then_with(|| a.member.cmp(&b.member))
    };
    creditors.sort_by(by_magnitude);
    debtors.sort_by(by_magnitude);

    (creditors, debtors)
}

/// Computes a settlement plan at cent precision with one cent of tolerance.
///
/// # Errors
///
/// See [`SettlementOptimizer::optimize`].
pub fn optimize_settlement(balances: &BalanceMap) -> Result<Vec<Transfer>, ValidationError> {
    SettlementOptimizer::default().optimize(balances)
}
