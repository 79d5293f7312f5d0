//! Payment repository.

use cartsplit_core::ValidationError;
use cartsplit_core::settlement::{Payment, PaymentStatus, validate_payment};
use cartsplit_shared::AppError;
use cartsplit_shared::types::{GroupId, ItemId, MemberId, PaymentId};
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Error types for payment storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Payment not found.
    #[error("Payment {0} not found")]
    PaymentNotFound(PaymentId),

    /// A payment with this ID is already stored.
    #[error("Payment {0} already exists")]
    DuplicatePayment(PaymentId),

    /// The payment failed validation or an illegal transition was attempted.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PaymentNotFound(_) => Self::NotFound(err.to_string()),
            StoreError::DuplicatePayment(_) => Self::Conflict(err.to_string()),
            StoreError::Validation(inner) => inner.into(),
        }
    }
}

/// Input for recording a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    /// Group the payment belongs to.
    pub group_id: GroupId,
    /// Member whose balance is debited.
    pub from: MemberId,
    /// Member whose balance is credited.
    pub to: MemberId,
    /// Non-negative amount.
    pub amount: Decimal,
    /// Initial status; `Settled` records an already-completed payment.
    #[serde(default)]
    pub status: PaymentStatus,
    /// Free-form note.
    #[serde(default)]
    pub description: Option<String>,
    /// Items this payment covers.
    #[serde(default)]
    pub related_items: Vec<ItemId>,
}

impl NewPayment {
    fn into_payment(self) -> Result<Payment, ValidationError> {
        let mut payment = Payment::pending(self.group_id, self.from, self.to, self.amount)
            .with_related_items(self.related_items);
        payment.description = self.description;
        if self.status == PaymentStatus::Settled {
            payment.settle(payment.date)?;
        }
        Ok(payment)
    }
}

/// Storage for group payments.
///
/// Payments are append-only; the only mutation is `Pending -> Settled`.
pub trait PaymentRepository: Send + Sync {
    /// Stores an already-built payment after validating it.
    fn insert(&self, payment: Payment) -> Result<Payment, StoreError>;

    /// Moves a payment to `Settled` and returns the updated record.
    fn settle(&self, id: PaymentId) -> Result<Payment, StoreError>;

    /// Looks up a payment by ID.
    fn find(&self, id: PaymentId) -> Option<Payment>;

    /// Payments of a group, optionally filtered by status, ordered by date
    /// then ID.
    fn list_by_group(&self, group_id: &GroupId, status: Option<PaymentStatus>) -> Vec<Payment>;

    /// Builds, validates, and stores a payment.
    fn record(&self, input: NewPayment) -> Result<Payment, StoreError> {
        self.insert(input.into_payment()?)
    }
}

/// Thread-safe in-memory payment repository.
#[derive(Debug, Default)]
pub struct InMemoryPaymentRepository {
    payments: DashMap<PaymentId, Payment>,
}

impl InMemoryPaymentRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored payments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payments.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }
}

impl PaymentRepository for InMemoryPaymentRepository {
    fn insert(&self, payment: Payment) -> Result<Payment, StoreError> {
        validate_payment(&payment)?;
        match self.payments.entry(payment.id) {
            Entry::Occupied(_) => Err(StoreError::DuplicatePayment(payment.id)),
            Entry::Vacant(slot) => {
                info!(
                    payment_id = %payment.id,
                    group_id = %payment.group_id,
                    from = %payment.from,
                    to = %payment.to,
                    amount = %payment.amount,
                    "Payment recorded"
                );
                slot.insert(payment.clone());
                Ok(payment)
            }
        }
    }

    fn settle(&self, id: PaymentId) -> Result<Payment, StoreError> {
        let mut payment = self
            .payments
            .get_mut(&id)
            .ok_or(StoreError::PaymentNotFound(id))?;
        payment.settle(Utc::now())?;
        info!(payment_id = %id, "Payment settled");
        Ok(payment.value().clone())
    }

    fn find(&self, id: PaymentId) -> Option<Payment> {
        self.payments.get(&id).map(|payment| payment.value().clone())
    }

    fn list_by_group(&self, group_id: &GroupId, status: Option<PaymentStatus>) -> Vec<Payment> {
        let mut payments: Vec<Payment> = self
            .payments
            .iter()
            .filter(|payment| &payment.group_id == group_id)
            .filter(|payment| status.is_none_or(|s| payment.status == s))
            .map(|payment| payment.value().clone())
            .collect();
        payments.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        payments
    }
}
