//! Settlement service: payments in, settlement plan out.

use cartsplit_shared::SettlementConfig;
use cartsplit_shared::types::MemberId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::balance::compute_balances;
use super::optimizer::SettlementOptimizer;
use super::types::{BalanceMap, Payment, Transfer, checked_sum};
use crate::error::ValidationError;

/// "You owe / owed to you" view of one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSummary {
    /// The member.
    pub member: MemberId,
    /// Net balance before settlement.
    pub balance: Decimal,
    /// Total the member pays out under the plan.
    pub owes: Decimal,
    /// Total the member receives under the plan.
    pub owed: Decimal,
}

/// Balances of a group together with the transfers that settle them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPlan {
    /// Net balances computed from the payments.
    pub balances: BalanceMap,
    /// Transfers that zero the balances.
    pub transfers: Vec<Transfer>,
}

impl SettlementPlan {
    /// Summary for a single member. Members outside the group get zeros.
    #[must_use]
    pub fn summary_for(&self, member: &MemberId) -> MemberSummary {
        let mut owes = Decimal::ZERO;
        let mut owed = Decimal::ZERO;
        for transfer in &self.transfers {
            if &transfer.from == member {
                owes += transfer.amount;
            }
            if &transfer.to == member {
                owed += transfer.amount;
            }
        }
        MemberSummary {
            member: member.clone(),
            balance: self.balances.get(member),
            owes,
            owed,
        }
    }

    /// Summaries for every member in the balance map, in member order.
    #[must_use]
    pub fn summaries(&self) -> Vec<MemberSummary> {
        self.balances
            .iter()
            .map(|(member, _)| self.summary_for(member))
            .collect()
    }

    /// Balances implied by the transfers alone.
    pub fn replay(&self) -> Result<BalanceMap, ValidationError> {
        BalanceMap::replay(&self.transfers)
    }

    /// Total money moved by the plan.
    ///
    /// `None` if the total does not fit in a `Decimal`.
    #[must_use]
    pub fn transfer_volume(&self) -> Option<Decimal> {
        checked_sum(self.transfers.iter().map(|transfer| transfer.amount)).ok()
    }

    /// Returns true if nobody needs to pay anybody.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }
}

/// Settlement service.
///
/// Stateless apart from its optimizer settings; safe to share across
/// threads and call concurrently.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettlementService {
    optimizer: SettlementOptimizer,
}

impl SettlementService {
    /// Creates a service around the given optimizer.
    #[must_use]
    pub const fn new(optimizer: SettlementOptimizer) -> Self {
        Self { optimizer }
    }

    /// Creates a service from the settlement configuration.
    #[must_use]
    pub fn from_config(config: &SettlementConfig) -> Self {
        Self::new(SettlementOptimizer::from_config(config))
    }

    /// Aggregates `payments` and plans their settlement.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if a payment is malformed or the
    /// resulting balances cannot be settled.
    pub fn settle_group(&self, payments: &[Payment]) -> Result<SettlementPlan, ValidationError> {
        let balances = compute_balances(payments)?;
        let transfers = self.optimizer.optimize(&balances)?;

        let plan = SettlementPlan {
            balances,
            transfers,
        };
        info!(
            payment_count = payments.len(),
            transfer_count = plan.transfers.len(),
            volume = ?plan.transfer_volume(),
            "Settlement plan ready"
        );
        Ok(plan)
    }
}
