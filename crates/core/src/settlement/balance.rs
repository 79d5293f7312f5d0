//! Balance aggregation: folds payments into per-member net positions.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::types::{BalanceMap, Payment};
use crate::error::ValidationError;

/// Validates a single payment before it touches any balance.
pub fn validate_payment(payment: &Payment) -> Result<(), ValidationError> {
    if payment.amount < Decimal::ZERO {
        warn!(payment_id = %payment.id, amount = %payment.amount, "Rejected payment with negative amount");
        return Err(ValidationError::NegativeAmount {
            amount: payment.amount,
        });
    }
    Ok(())
}

/// Validates every payment, failing on the first bad one.
pub fn validate_payments(payments: &[Payment]) -> Result<(), ValidationError> {
    payments.iter().try_for_each(validate_payment)
}

/// Computes the net balance of every member touched by `payments`.
///
/// The payer of each payment is debited and the payee credited, so the
/// result always sums to exactly zero. Input order does not matter.
///
/// # Errors
///
/// Returns `ValidationError::NegativeAmount` if any payment is negative;
/// nothing is aggregated in that case. Returns
/// `ValidationError::AmountOverflow` if a running balance leaves the range
/// `Decimal` can represent.
pub fn compute_balances(payments: &[Payment]) -> Result<BalanceMap, ValidationError> {
    validate_payments(payments)?;

    let mut balances = BalanceMap::new();
    for payment in payments {
        balances.debit(&payment.from, payment.amount)?;
        balances.credit(&payment.to, payment.amount)?;
    }

    debug!(
        payment_count = payments.len(),
        member_count = balances.len(),
        "Computed group balances"
    );
    Ok(balances)
}
