//! Domain types for payments, balances, and transfers.

use std::collections::BTreeMap;

use cartsplit_shared::types::{GroupId, ItemId, MemberId, PaymentId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Lifecycle of a payment. The only transition is `Pending -> Settled`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Recorded but not yet paid out.
    #[default]
    Pending,
    /// Paid; the record is now immutable.
    Settled,
}

/// A directed, dated money movement between two members of a group.
///
/// The payer (`from`) loses `amount` of balance and the payee (`to`) gains it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment ID.
    pub id: PaymentId,
    /// Group the payment belongs to.
    pub group_id: GroupId,
    /// Member whose balance is debited.
    pub from: MemberId,
    /// Member whose balance is credited.
    pub to: MemberId,
    /// Non-negative amount in the implied currency.
    pub amount: Decimal,
    /// Current status.
    #[serde(default)]
    pub status: PaymentStatus,
    /// When the payment was recorded.
    pub date: DateTime<Utc>,
    /// When the payment was settled.
    #[serde(default)]
    pub settled_at: Option<DateTime<Utc>>,
    /// Free-form note.
    #[serde(default)]
    pub description: Option<String>,
    /// Items this payment pays for.
    #[serde(default)]
    pub related_items: Vec<ItemId>,
}

impl Payment {
    /// Creates a pending payment stamped with the current time.
    #[must_use]
    pub fn pending(group_id: GroupId, from: MemberId, to: MemberId, amount: Decimal) -> Self {
        Self {
            id: PaymentId::new(),
            group_id,
            from,
            to,
            amount,
            status: PaymentStatus::Pending,
            date: Utc::now(),
            settled_at: None,
            description: None,
            related_items: Vec::new(),
        }
    }

    /// Attaches a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches the items this payment covers.
    #[must_use]
    pub fn with_related_items(mut self, items: Vec<ItemId>) -> Self {
        self.related_items = items;
        self
    }

    /// Returns true once the payment has been settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.status == PaymentStatus::Settled
    }

    /// Moves the payment from `Pending` to `Settled`.
    pub fn settle(&mut self, at: DateTime<Utc>) -> Result<(), ValidationError> {
        if self.is_settled() {
            return Err(ValidationError::AlreadySettled(self.id));
        }
        self.status = PaymentStatus::Settled;
        self.settled_at = Some(at);
        Ok(())
    }
}

/// A settlement instruction: `from` pays `to` a strictly positive `amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Paying member (a debtor).
    pub from: MemberId,
    /// Receiving member (a creditor).
    pub to: MemberId,
    /// Amount moved.
    pub amount: Decimal,
}

impl Transfer {
    /// Creates a transfer.
    #[must_use]
    pub const fn new(from: MemberId, to: MemberId, amount: Decimal) -> Self {
        Self { from, to, amount }
    }
}

/// Net signed position of every member of a group.
///
/// Positive means the member is owed money, negative means they owe.
/// Iteration is ordered by member ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceMap(BTreeMap<MemberId, Decimal>);

impl BalanceMap {
    /// Creates an empty balance map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `member`, zero if never seen.
    #[must_use]
    pub fn get(&self, member: &MemberId) -> Decimal {
        self.0.get(member).copied().unwrap_or(Decimal::ZERO)
    }

    /// Adds `amount` to a member's balance.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::AmountOverflow` if the balance leaves the
    /// representable range; the balance is left unchanged.
    pub fn credit(&mut self, member: &MemberId, amount: Decimal) -> Result<(), ValidationError> {
        let balance = self.0.entry(member.clone()).or_insert(Decimal::ZERO);
        *balance = balance
            .checked_add(amount)
            .ok_or(ValidationError::AmountOverflow)?;
        Ok(())
    }

    /// Subtracts `amount` from a member's balance.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::AmountOverflow` if the balance leaves the
    /// representable range; the balance is left unchanged.
    pub fn debit(&mut self, member: &MemberId, amount: Decimal) -> Result<(), ValidationError> {
        let balance = self.0.entry(member.clone()).or_insert(Decimal::ZERO);
        *balance = balance
            .checked_sub(amount)
            .ok_or(ValidationError::AmountOverflow)?;
        Ok(())
    }

    /// Applies a transfer: the payer's debt shrinks, the payee's claim shrinks.
    ///
    /// This is the inverse of what a payment does, so applying a full
    /// settlement plan to the balances it was computed from yields zero.
    pub fn apply(&mut self, transfer: &Transfer) -> Result<(), ValidationError> {
        self.credit(&transfer.from, transfer.amount)?;
        self.debit(&transfer.to, transfer.amount)
    }

    /// Rebuilds the balances that `transfers` would settle, starting from a
    /// zero ledger.
    pub fn replay(transfers: &[Transfer]) -> Result<Self, ValidationError> {
        let mut balances = Self::new();
        for transfer in transfers {
            balances.debit(&transfer.from, transfer.amount)?;
            balances.credit(&transfer.to, transfer.amount)?;
        }
        Ok(balances)
    }

    /// Sum of all balances. Zero for any map built from payments.
    pub fn total(&self) -> Result<Decimal, ValidationError> {
        checked_sum(self.0.values().copied())
    }

    /// Returns true if every member is at zero.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.0.values().all(Decimal::is_zero)
    }

    /// Copy of the map without zero-balance members.
    #[must_use]
    pub fn without_zeros(&self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(_, balance)| !balance.is_zero())
                .map(|(member, balance)| (member.clone(), *balance))
                .collect(),
        )
    }

    /// Number of members tracked, including zero balances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no member is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates `(member, balance)` pairs in member order.
    pub fn iter(&self) -> impl Iterator<Item = (&MemberId, &Decimal)> {
        self.0.iter()
    }
}

/// Later entries for the same member replace earlier ones.
impl FromIterator<(MemberId, Decimal)> for BalanceMap {
    fn from_iter<T: IntoIterator<Item = (MemberId, Decimal)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Adds up `amounts`, failing instead of panicking on overflow.
pub(crate) fn checked_sum(amounts: impl IntoIterator<Item = Decimal>) -> Result<Decimal, ValidationError> {
    amounts.into_iter().try_fold(Decimal::ZERO, |total, amount| {
        total.checked_add(amount).ok_or(ValidationError::AmountOverflow)
    })
}

impl<'a> IntoIterator for &'a BalanceMap {
    type Item = (&'a MemberId, &'a Decimal);
    type IntoIter = std::collections::btree_map::Iter<'a, MemberId, Decimal>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
