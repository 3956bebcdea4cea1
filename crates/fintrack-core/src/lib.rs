//! Core transaction processing and business logic
//!
//! - `types`: enumerated value sets (categories, payment methods, frequencies)
//! - `models`: the stored record and validated create/update inputs
//! - `validate`: raw input checks run before any store access
//! - `store`: persistence seam and the in-memory store
//! - `reports`: pagination and stats aggregation
//! - `service`: owner-scoped operations tying the above together

pub mod error;
pub mod models;
pub mod reports;
pub mod service;
pub mod store;
pub mod types;
pub mod validate;

pub use error::{
    CoreError, CoreResult, DefaultErrorLogger, ErrorCode, ErrorContext, ErrorDetails, ErrorLogger,
    ErrorSeverity, FieldError, ValidationErrors,
};
pub use models::{NewTransaction, Recurrence, Transaction, TransactionKind, TransactionPatch};
pub use reports::{Pagination, StatsGroup, StatsReport, StatsSummary, TransactionPage};
pub use service::TransactionService;
pub use store::{MemoryStore, StoreError, StoreQuery, StoreRef, TransactionStore, UpdateOutcome};
pub use types::{
    Category, ExpenseCategory, GroupBy, IncomeCategory, PaymentMethod, RecurringFrequency,
    TransactionType,
};
pub use validate::{ListQuery, StatsQuery, TransactionPayload};
