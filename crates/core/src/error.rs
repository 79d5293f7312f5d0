//! Validation errors for settlement and splitting.
//!
//! Every error here is deterministic: the same input always fails the same
//! way, so none of them are worth retrying.

use cartsplit_shared::AppError;
use cartsplit_shared::types::{MemberId, PaymentId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Malformed input rejected before any computation happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A monetary amount is below zero.
    #[error("Amount must not be negative, got {amount}")]
    NegativeAmount {
        /// The offending amount.
        amount: Decimal,
    },

    /// An equal split was requested over zero members.
    #[error("Cannot split among zero members")]
    NoMembers,

    /// A weighted split was requested with no shares.
    #[error("Share map must not be empty")]
    EmptyShares,

    /// A share weight is below zero.
    #[error("Share weight for {member} must not be negative, got {weight}")]
    NegativeWeight {
        /// Member holding the weight.
        member: MemberId,
        /// The offending weight.
        weight: Decimal,
    },

    /// All share weights are zero.
    #[error("Share weights must not sum to zero")]
    ZeroTotalWeight,

    /// The balance map handed to the optimizer does not net to zero.
    #[error("Balances do not net to zero: sum {sum}, tolerance {tolerance}")]
    UnbalancedBalances {
        /// Sum of all balances.
        sum: Decimal,
        /// Largest accepted deviation from zero.
        tolerance: Decimal,
    },

    /// The payment has already moved to `Settled`.
    #[error("Payment {0} is already settled")]
    AlreadySettled(PaymentId),

    /// Custom split amounts do not add up to the bill total.
    #[error("Custom split amounts sum to {actual}, expected {expected}")]
    CustomSplitMismatch {
        /// The bill total.
        expected: Decimal,
        /// Sum of the custom amounts.
        actual: Decimal,
    },

    /// Percentage split does not add up to 100.
    #[error("Percentages must sum to 100, got {total}")]
    PercentagesMismatch {
        /// Sum of the percentages.
        total: Decimal,
    },

    /// A member appears twice in a participant list.
    #[error("Member {0} appears more than once")]
    DuplicateParticipant(MemberId),

    /// The member does not take part in the bill.
    #[error("Member {0} is not a participant")]
    UnknownParticipant(MemberId),

    /// The participant has already paid their part.
    #[error("Member {0} has already paid")]
    AlreadyPaid(MemberId),

    /// An amount left the range `Decimal` can represent.
    #[error("Amount arithmetic overflowed")]
    AmountOverflow,

    /// A split could not hand out its whole remainder.
    #[error("Split left {remainder} unallocated")]
    UnallocatedRemainder {
        /// Amount that could not be distributed.
        remainder: Decimal,
    },
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::AlreadySettled(_) | ValidationError::AlreadyPaid(_) => {
                Self::Conflict(err.to_string())
            }
            ValidationError::UnknownParticipant(_) => Self::NotFound(err.to_string()),
            _ => Self::Validation(err.to_string()),
        }
    }
}
