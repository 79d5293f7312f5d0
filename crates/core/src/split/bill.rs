//! Bills shared among group members.

use std::collections::{BTreeMap, BTreeSet};

use cartsplit_shared::types::{BillId, GroupId, MemberId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::allocation::BillSplitter;
use super::item::ItemCategory;
use crate::error::ValidationError;
use crate::settlement::Payment;
use crate::settlement::types::checked_sum;

/// How a bill total was divided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitType {
    /// Same amount for everyone.
    Equal,
    /// Explicit amounts per member.
    Custom,
    /// Percentage per member.
    Percentage,
}

/// Payment state of a bill, derived from its participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    /// Nobody has paid.
    Pending,
    /// Some participants have paid.
    PartiallyPaid,
    /// Everyone has paid.
    FullyPaid,
}

/// How to divide a new bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "members", rename_all = "snake_case")]
pub enum SplitRequest {
    /// Equal split among the listed members, in order.
    Equal(Vec<MemberId>),
    /// Explicit amounts; must add up to the total.
    Custom(BTreeMap<MemberId, Decimal>),
    /// Percentages; must add up to 100.
    Percentage(BTreeMap<MemberId, Decimal>),
}

impl SplitRequest {
    const fn split_type(&self) -> SplitType {
        match self {
            Self::Equal(_) => SplitType::Equal,
            Self::Custom(_) => SplitType::Custom,
            Self::Percentage(_) => SplitType::Percentage,
        }
    }
}

/// Input for creating a bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBillInput {
    /// Display name.
    pub name: String,
    /// Amount to divide.
    pub total_amount: Decimal,
    /// Member who paid the bill up front.
    pub created_by: MemberId,
    /// Category.
    #[serde(default)]
    pub category: ItemCategory,
    /// How to divide the total.
    pub split: SplitRequest,
}

/// One member's part of a bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillParticipant {
    /// The member.
    pub member: MemberId,
    /// Their part of the total.
    pub amount: Decimal,
    /// Whether they have paid it.
    pub paid: bool,
    /// When they paid.
    pub paid_at: Option<DateTime<Utc>>,
}

/// A bill divided among members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    /// Bill ID.
    pub id: BillId,
    /// Display name.
    pub name: String,
    /// Total amount, rounded to the minor unit.
    pub total_amount: Decimal,
    /// Participants and their parts.
    pub participants: Vec<BillParticipant>,
    /// How the total was divided.
    pub split_type: SplitType,
    /// Category.
    pub category: ItemCategory,
    /// Member who paid the bill up front.
    pub created_by: MemberId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Bill {
    /// Creates a bill, dividing the total according to `input.split`.
    ///
    /// The participant amounts always sum to the rounded total. The creator
    /// is marked as having paid their own part.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for a negative total, an empty or
    /// duplicated member list, negative amounts or percentages, custom
    /// amounts that miss the total, or percentages that miss 100.
    pub fn assign(input: CreateBillInput, splitter: &BillSplitter) -> Result<Self, ValidationError> {
        let precision = splitter.precision();
        if input.total_amount < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount {
                amount: input.total_amount,
            });
        }
        let total_amount = precision.round(input.total_amount);

        let amounts: Vec<(MemberId, Decimal)> = match &input.split {
            SplitRequest::Equal(members) => {
                ensure_unique(members)?;
                let parts = splitter.split_equally(total_amount, members.len())?;
                members.iter().cloned().zip(parts).collect()
            }
            SplitRequest::Custom(amounts) => {
                if amounts.is_empty() {
                    return Err(ValidationError::EmptyShares);
                }
                if let Some(amount) = amounts.values().find(|a| **a < Decimal::ZERO) {
                    return Err(ValidationError::NegativeAmount { amount: *amount });
                }
                let rounded: Vec<(MemberId, Decimal)> = amounts
                    .iter()
                    .map(|(member, amount)| (member.clone(), precision.round(*amount)))
                    .collect();
                let actual = checked_sum(rounded.iter().map(|(_, amount)| *amount))?;
                if actual != total_amount {
                    return Err(ValidationError::CustomSplitMismatch {
                        expected: total_amount,
                        actual,
                    });
                }
                rounded
            }
            SplitRequest::Percentage(percentages) => {
                let total = checked_sum(percentages.values().copied())?;
                if !percentages.is_empty()
                    && percentages.values().all(|p| *p >= Decimal::ZERO)
                    && total != Decimal::ONE_HUNDRED
                {
                    return Err(ValidationError::PercentagesMismatch { total });
                }
                splitter
                    .split_by_shares(total_amount, percentages)?
                    .into_iter()
                    .collect()
            }
        };

        let created_at = Utc::now();
        let participants = amounts
            .into_iter()
            .map(|(member, amount)| {
                let paid = member == input.created_by;
                BillParticipant {
                    member,
                    amount,
                    paid,
                    paid_at: paid.then_some(created_at),
                }
            })
            .collect();

        Ok(Self {
            id: BillId::new(),
            name: input.name,
            total_amount,
            participants,
            split_type: input.split.split_type(),
            category: input.category,
            created_by: input.created_by,
            created_at,
        })
    }

    /// Payment state derived from the participants' `paid` flags.
    #[must_use]
    pub fn status(&self) -> BillStatus {
        let paid = self.participants.iter().filter(|p| p.paid).count();
        if paid == 0 {
            BillStatus::Pending
        } else if paid == self.participants.len() {
            BillStatus::FullyPaid
        } else {
            BillStatus::PartiallyPaid
        }
    }

    /// Marks a participant's part as paid.
    pub fn mark_paid(&mut self, member: &MemberId, at: DateTime<Utc>) -> Result<(), ValidationError> {
        let participant = self
            .participants
            .iter_mut()
            .find(|p| &p.member == member)
            .ok_or_else(|| ValidationError::UnknownParticipant(member.clone()))?;
        if participant.paid {
            return Err(ValidationError::AlreadyPaid(member.clone()));
        }
        participant.paid = true;
        participant.paid_at = Some(at);
        Ok(())
    }

    /// Sum of the parts not yet paid.
    #[must_use]
    pub fn outstanding(&self) -> Decimal {
        self.participants
            .iter()
            .filter(|p| !p.paid)
            .map(|p| p.amount)
            .sum()
    }

    /// Pending payments from every unpaid participant to the bill's creator.
    #[must_use]
    pub fn obligations(&self, group_id: &GroupId) -> Vec<Payment> {
        self.participants
            .iter()
            .filter(|p| !p.paid && p.member != self.created_by && !p.amount.is_zero())
            .map(|p| {
                Payment::pending(
                    group_id.clone(),
                    p.member.clone(),
                    self.created_by.clone(),
                    p.amount,
                )
                .with_description(self.name.clone())
            })
            .collect()
    }
}

fn ensure_unique(members: &[MemberId]) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for member in members {
        if !seen.insert(member) {
            return Err(ValidationError::DuplicateParticipant(member.clone()));
        }
    }
    Ok(())
}
