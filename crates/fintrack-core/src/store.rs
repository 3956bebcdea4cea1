//! Persistence seam for transaction records
//!
//! The service only talks to `TransactionStore`. Every primitive is keyed by
//! owner id, so a record owned by someone else looks exactly like a missing one.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{Transaction, TransactionPatch};
use crate::types::{Category, TransactionType};

/// Failures raised by a store backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store operation timed out: {operation}")]
    Timeout { operation: &'static str },

    #[error("Store failure: {message}")]
    Backend { message: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Record filter understood by every store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreQuery {
    pub transaction_type: Option<TransactionType>,
    pub category: Option<Category>,
    /// Inclusive lower bound on `date`
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on `date`
    pub date_to: Option<NaiveDate>,
    pub tag: Option<String>,
    /// Case-insensitive substring of `description`
    pub search: Option<String>,
}

impl StoreQuery {
    pub fn matches(&self, record: &Transaction) -> bool {
        if let Some(t) = self.transaction_type {
            if record.transaction_type() != t {
                return false;
            }
        }
        if let Some(c) = self.category {
            if record.kind.category() != c {
                return false;
            }
        }
        if let Some(from) = self.date_from {
            if record.date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if record.date > to {
                return false;
            }
        }
        if let Some(ref tag) = self.tag {
            if !record.tags.contains(tag) {
                return false;
            }
        }
        if let Some(ref needle) = self.search {
            if !record.description.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

/// What an atomic partial update did
#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(Transaction),
    /// No record with that id belongs to the owner
    Missing,
    /// The patch does not fit the stored record; nothing was written
    Rejected(CoreError),
}

/// Store reference type
pub type StoreRef = Arc<dyn TransactionStore>;

/// Create/find/update/delete primitives over owned records.
/// Each call touches at most one record and is atomic on it.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persist a new record
    async fn insert(&self, record: Transaction) -> StoreResult<Transaction>;

    /// All records of `owner_id` matching `query`, in no particular order
    async fn find(&self, owner_id: &str, query: &StoreQuery) -> StoreResult<Vec<Transaction>>;

    async fn find_one(&self, owner_id: &str, id: Uuid) -> StoreResult<Option<Transaction>>;

    /// Apply `patch` to a record of `owner_id` and stamp it with `now`.
    /// Reading, patching and writing back happen as one step, so concurrent
    /// updates to the same record never overwrite each other's fields.
    async fn update(
        &self,
        owner_id: &str,
        id: Uuid,
        patch: &TransactionPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<UpdateOutcome>;

    /// Returns whether a record was removed
    async fn delete(&self, owner_id: &str, id: Uuid) -> StoreResult<bool>;
}

/// In-process store backed by a map
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Uuid, Transaction>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn insert(&self, record: Transaction) -> StoreResult<Transaction> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(StoreError::Backend {
                message: format!("duplicate id {}", record.id),
            });
        }
        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find(&self, owner_id: &str, query: &StoreQuery) -> StoreResult<Vec<Transaction>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.owner_id == owner_id && query.matches(r))
            .cloned()
            .collect())
    }

    async fn find_one(&self, owner_id: &str, id: Uuid) -> StoreResult<Option<Transaction>> {
        let records = self.records.read().await;
        Ok(records.get(&id).filter(|r| r.owner_id == owner_id).cloned())
    }

    async fn update(
        &self,
        owner_id: &str,
        id: Uuid,
        patch: &TransactionPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<UpdateOutcome> {
        let mut records = self.records.write().await;
        let record = match records.get_mut(&id) {
            Some(record) if record.owner_id == owner_id => record,
            _ => return Ok(UpdateOutcome::Missing),
        };

        if let Err(e) = record.apply_patch(patch) {
            return Ok(UpdateOutcome::Rejected(e));
        }
        record.touch(now);
        Ok(UpdateOutcome::Updated(record.clone()))
    }

    async fn delete(&self, owner_id: &str, id: Uuid) -> StoreResult<bool> {
        let mut records = self.records.write().await;
        match records.get(&id) {
            Some(existing) if existing.owner_id == owner_id => {
                records.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
