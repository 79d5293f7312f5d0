//! Group debt settlement.
//!
//! This module implements the settlement pipeline:
//! - Payment, transfer, and balance map types
//! - Balance aggregation from payments
//! - Greedy settlement planning over a balance map
//! - A service tying both together, with per-member summaries

pub mod balance;
pub mod optimizer;
pub mod service;
pub mod types;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod optimizer_props;

pub use balance::{compute_balances, validate_payment, validate_payments};
pub use optimizer::{SettlementOptimizer, optimize_settlement};
pub use service::{MemberSummary, SettlementPlan, SettlementService};
pub use types::{BalanceMap, Payment, PaymentStatus, Transfer};
