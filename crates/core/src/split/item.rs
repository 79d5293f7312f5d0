//! Shopping items and the obligations a purchase creates.

use std::collections::BTreeMap;

use cartsplit_shared::types::{GroupId, ItemId, MemberId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::allocation::BillSplitter;
use crate::error::ValidationError;
use crate::settlement::Payment;

/// Where an item is in the shopping flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Still needs buying.
    #[default]
    ToBuy,
    /// Already in stock at home.
    AtHome,
    /// Bought by a member.
    Purchased,
    /// Deferred to a later trip.
    Postponed,
}

/// How urgently an item is needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Nice to have.
    Low,
    /// Regular item.
    #[default]
    Medium,
    /// Needed soon.
    High,
    /// Needed now.
    Urgent,
}

/// Item category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    /// Food and drink.
    Groceries,
    /// Cleaning and home supplies.
    Household,
    /// Personal care.
    Personal,
    /// Devices and accessories.
    Electronics,
    /// Clothing.
    Clothing,
    /// Health and pharmacy.
    Health,
    /// Anything else.
    #[default]
    Other,
}

/// A shopping-list item with the members who share its cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Item ID.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Category.
    #[serde(default)]
    pub category: ItemCategory,
    /// Number of units.
    pub quantity: u32,
    /// Price per unit.
    pub price: Decimal,
    /// Shopping status.
    #[serde(default)]
    pub status: ItemStatus,
    /// Priority.
    #[serde(default)]
    pub priority: Priority,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Portion of the cost each member carries.
    #[serde(default)]
    pub assigned_payers: BTreeMap<MemberId, Decimal>,
    /// Member who added the item.
    pub added_by: MemberId,
    /// Member who bought the item.
    #[serde(default)]
    pub purchased_by: Option<MemberId>,
    /// When the item was bought.
    #[serde(default)]
    pub purchased_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Creates an item that still needs buying.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        category: ItemCategory,
        quantity: u32,
        price: Decimal,
        added_by: MemberId,
    ) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            category,
            quantity,
            price,
            status: ItemStatus::ToBuy,
            priority: Priority::default(),
            notes: None,
            assigned_payers: BTreeMap::new(),
            added_by,
            purchased_by: None,
            purchased_at: None,
        }
    }

    /// Price times quantity.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::AmountOverflow` if the product does not fit
    /// in a `Decimal`.
    pub fn line_total(&self) -> Result<Decimal, ValidationError> {
        self.price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or(ValidationError::AmountOverflow)
    }

    /// Records the purchase.
    pub fn mark_purchased(&mut self, by: MemberId, at: DateTime<Utc>) {
        self.status = ItemStatus::Purchased;
        self.purchased_by = Some(by);
        self.purchased_at = Some(at);
    }

    /// Divides the line total among members by weight and stores the result
    /// as the item's payer assignment.
    pub fn assign_by_shares(
        &mut self,
        shares: &BTreeMap<MemberId, Decimal>,
        splitter: &BillSplitter,
    ) -> Result<(), ValidationError> {
        if self.price < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount { amount: self.price });
        }
        self.assigned_payers = splitter.split_by_shares(self.line_total()?, shares)?;
        Ok(())
    }
}

/// Sums price times quantity over all items.
///
/// # Errors
///
/// Returns `ValidationError::NegativeAmount` if any price is negative, or
/// `ValidationError::AmountOverflow` if the total does not fit in a `Decimal`.
pub fn calculate_total(items: &[Item]) -> Result<Decimal, ValidationError> {
    items.iter().try_fold(Decimal::ZERO, |total, item| {
        if item.price < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount { amount: item.price });
        }
        total
            .checked_add(item.line_total()?)
            .ok_or(ValidationError::AmountOverflow)
    })
}

/// Payments owed to the purchaser of `item` by every other assigned payer.
///
/// Items that have not been purchased produce no payments. The purchaser's
/// own share and zero shares are skipped.
///
/// # Errors
///
/// Returns `ValidationError::NegativeAmount` if an assigned share is negative.
pub fn purchase_obligations(group_id: &GroupId, item: &Item) -> Result<Vec<Payment>, ValidationError> {
    let (ItemStatus::Purchased, Some(purchaser)) = (item.status, item.purchased_by.as_ref()) else {
        return Ok(Vec::new());
    };

    let mut payments = Vec::new();
    for (member, share) in &item.assigned_payers {
        if *share < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount { amount: *share });
        }
        if member == purchaser || share.is_zero() {
            continue;
        }
        payments.push(
            Payment::pending(group_id.clone(), member.clone(), purchaser.clone(), *share)
                .with_description(format!("Share of {}", item.name))
                .with_related_items(vec![item.id]),
        );
    }

    debug!(item_id = %item.id, obligation_count = payments.len(), "Derived purchase obligations");
    Ok(payments)
}
