//! Core data models for transaction records

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationErrors};
use crate::types::{
    Category, ExpenseCategory, IncomeCategory, PaymentMethod, RecurringFrequency, TransactionType,
};

/// The type-specific half of a record. Income records can only carry a
/// `source` and expense records can only carry a `paymentMethod`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransactionKind {
    Income {
        category: IncomeCategory,
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },
    Expense {
        category: ExpenseCategory,
        #[serde(rename = "paymentMethod", skip_serializing_if = "Option::is_none")]
        payment_method: Option<PaymentMethod>,
    },
}

impl TransactionKind {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            TransactionKind::Income { .. } => TransactionType::Income,
            TransactionKind::Expense { .. } => TransactionType::Expense,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            TransactionKind::Income { category, .. } => Category::Income(*category),
            TransactionKind::Expense { category, .. } => Category::Expense(*category),
        }
    }

    pub fn source(&self) -> Option<&str> {
        match self {
            TransactionKind::Income { source, .. } => source.as_deref(),
            TransactionKind::Expense { .. } => None,
        }
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        match self {
            TransactionKind::Income { .. } => None,
            TransactionKind::Expense { payment_method, .. } => *payment_method,
        }
    }
}

/// Whether a record repeats. Serialized as `isRecurring` plus an optional
/// `recurringFrequency`, which is present exactly when `isRecurring` is true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "RecurrenceFields")]
pub enum Recurrence {
    OneOff,
    Every(RecurringFrequency),
}

impl Default for Recurrence {
    fn default() -> Self {
        Recurrence::OneOff
    }
}

impl Recurrence {
    pub fn is_recurring(&self) -> bool {
        matches!(self, Recurrence::Every(_))
    }

    pub fn frequency(&self) -> Option<RecurringFrequency> {
        match self {
            Recurrence::OneOff => None,
            Recurrence::Every(f) => Some(*f),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecurrenceFields {
    is_recurring: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    recurring_frequency: Option<RecurringFrequency>,
}

impl From<Recurrence> for RecurrenceFields {
    fn from(r: Recurrence) -> Self {
        Self {
            is_recurring: r.is_recurring(),
            recurring_frequency: r.frequency(),
        }
    }
}

/// A stored income or expense record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub owner_id: String,
    #[serde(flatten)]
    pub kind: TransactionKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub tags: BTreeSet<String>,
    #[serde(flatten)]
    pub recurrence: Recurrence,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Build a record from validated input, stamping id and timestamps
    pub fn new(owner_id: &str, input: NewTransaction, now: DateTime<Utc>) -> Self {
        Self {
            id: fintrack_utils::generate_id(),
            owner_id: owner_id.to_string(),
            kind: input.kind,
            amount: input.amount,
            description: input.description,
            date: input.date,
            tags: input.tags,
            recurrence: input.recurrence,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.kind.transaction_type()
    }

    /// Stamp a modification. `updatedAt` moves forward even when the clock
    /// has not advanced since the previous write.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = next_timestamp(self.updated_at, now);
    }

    /// Apply a validated partial update. Identity and timestamps are left to
    /// the caller; nothing is modified unless the whole patch is consistent.
    pub fn apply_patch(&mut self, patch: &TransactionPatch) -> CoreResult<()> {
        let kind = self.patched_kind(patch)?;
        let recurrence = self.patched_recurrence(patch)?;

        self.kind = kind;
        self.recurrence = recurrence;
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(ref description) = patch.description {
            self.description = description.clone();
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(ref tags) = patch.tags {
            self.tags = tags.clone();
        }
        Ok(())
    }

    fn patched_kind(&self, patch: &TransactionPatch) -> CoreResult<TransactionKind> {
        let current = self.transaction_type();
        let target = patch.transaction_type.unwrap_or(current);
        let type_changed = target != current;

        let category = match patch.category {
            Some(category) if category.transaction_type() != target => {
                return Err(CoreError::Validation(ValidationErrors::single(
                    "category",
                    format!("'{}' is not in the {} categories", category, target),
                )))
            }
            Some(category) => category,
            None if type_changed => {
                return Err(type_mismatch(format!(
                    "changing type to {} requires a category from the {} set",
                    target, target
                )))
            }
            None => self.kind.category(),
        };

        match category {
            Category::Income(category) => {
                if patch.payment_method.is_some() {
                    return Err(type_mismatch(
                        "paymentMethod only applies to expense transactions".to_string(),
                    ));
                }
                let source = match patch.source {
                    Some(ref s) => Some(s.clone()).filter(|s| !s.is_empty()),
                    None if type_changed => None,
                    None => self.kind.source().map(str::to_string),
                };
                Ok(TransactionKind::Income { category, source })
            }
            Category::Expense(category) => {
                if patch.source.is_some() {
                    return Err(type_mismatch(
                        "source only applies to income transactions".to_string(),
                    ));
                }
                let payment_method = match patch.payment_method {
                    Some(m) => Some(m),
                    None if type_changed => None,
                    None => self.kind.payment_method(),
                };
                Ok(TransactionKind::Expense { category, payment_method })
            }
        }
    }

    fn patched_recurrence(&self, patch: &TransactionPatch) -> CoreResult<Recurrence> {
        match (patch.is_recurring, patch.recurring_frequency) {
            (None, None) => Ok(self.recurrence),
            (Some(false), None) => Ok(Recurrence::OneOff),
            (Some(false), Some(_)) => Err(CoreError::Validation(ValidationErrors::single(
                "recurringFrequency",
                "must be absent when isRecurring is false",
            ))),
            (Some(true), Some(frequency)) => Ok(Recurrence::Every(frequency)),
            (None, Some(frequency)) if self.recurrence.is_recurring() => {
                Ok(Recurrence::Every(frequency))
            }
            (None, Some(_)) => Err(CoreError::Validation(ValidationErrors::single(
                "recurringFrequency",
                "requires isRecurring to be true",
            ))),
            (Some(true), None) => match self.recurrence {
                Recurrence::Every(f) => Ok(Recurrence::Every(f)),
                Recurrence::OneOff => Err(CoreError::Validation(ValidationErrors::single(
                    "recurringFrequency",
                    "is required when isRecurring is true",
                ))),
            },
        }
    }
}

fn next_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn type_mismatch(message: String) -> CoreError {
    CoreError::TypeMismatch { message }
}

/// Validated input for creating a record
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub tags: BTreeSet<String>,
    pub recurrence: Recurrence,
}

/// Validated partial update. Each present field already satisfies its
/// per-field rule; cross-field consistency is checked by `apply_patch`.
/// An empty `source` clears the stored one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub transaction_type: Option<TransactionType>,
    pub amount: Option<Decimal>,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub source: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub tags: Option<BTreeSet<String>>,
    pub is_recurring: Option<bool>,
    pub recurring_frequency: Option<RecurringFrequency>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        *self == TransactionPatch::default()
    }
}
