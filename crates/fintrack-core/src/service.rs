//! Transaction service: owner-scoped CRUD, listing and stats over a store

use chrono::Utc;
use fintrack_config::{Config, PaginationConfig};
use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::models::Transaction;
use crate::reports::{StatsReport, TransactionPage};
use crate::store::{MemoryStore, StoreError, StoreRef, StoreResult, UpdateOutcome};
use crate::validate::{self, ListQuery, StatsQuery, TransactionPayload};

pub struct TransactionService {
    store: StoreRef,
    pagination: PaginationConfig,
    timeout: std::time::Duration,
}

impl TransactionService {
    pub fn new(store: StoreRef, config: &Config) -> Self {
        Self {
            store,
            pagination: config.pagination.clone(),
            timeout: config.store.timeout(),
        }
    }

    /// Service over a fresh in-process store
    pub fn in_memory(config: &Config) -> Self {
        Self::new(Arc::new(MemoryStore::new()), config)
    }

    /// Run one store call under the configured bound. A timed-out call is
    /// reported, never retried.
    async fn call<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = StoreResult<T>>,
    ) -> CoreResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(CoreError::from),
            Err(_) => {
                warn!("store {} exceeded {:?}", operation, self.timeout);
                Err(StoreError::Timeout { operation }.into())
            }
        }
    }

    async fn owned(&self, owner_id: &str, id: Uuid) -> CoreResult<Transaction> {
        self.call("find_one", self.store.find_one(owner_id, id))
            .await?
            .ok_or_else(|| CoreError::NotFound { id: id.to_string() })
    }

    pub async fn create(&self, owner_id: &str, payload: &TransactionPayload) -> CoreResult<Transaction> {
        let input = validate::validate_create(payload)?;
        let record = Transaction::new(owner_id, input, Utc::now());

        let stored = self.call("insert", self.store.insert(record)).await?;
        info!("created transaction {} for {}", stored.id, owner_id);
        Ok(stored)
    }

    pub async fn get_by_id(&self, owner_id: &str, id: &str) -> CoreResult<Transaction> {
        let id = validate::parse_id(id)?;
        debug!("get transaction {} for {}", id, owner_id);
        self.owned(owner_id, id).await
    }

    pub async fn list(&self, owner_id: &str, query: &ListQuery) -> CoreResult<TransactionPage> {
        let filter = validate::validate_list(query, &self.pagination)?;
        let records = self.call("find", self.store.find(owner_id, &filter.query)).await?;
        debug!(
            "list for {}: {} matching, page {} of size {}",
            owner_id,
            records.len(),
            filter.page,
            filter.limit
        );
        Ok(TransactionPage::from_records(records, filter.page, filter.limit))
    }

    pub async fn update(
        &self,
        owner_id: &str,
        id: &str,
        payload: &TransactionPayload,
    ) -> CoreResult<Transaction> {
        let id = validate::parse_id(id)?;
        let patch = validate::validate_update(payload)?;

        match self
            .call("update", self.store.update(owner_id, id, &patch, Utc::now()))
            .await?
        {
            UpdateOutcome::Updated(stored) => {
                info!("updated transaction {} for {}", id, owner_id);
                Ok(stored)
            }
            UpdateOutcome::Missing => Err(CoreError::NotFound { id: id.to_string() }),
            UpdateOutcome::Rejected(e) => Err(e),
        }
    }

    pub async fn delete(&self, owner_id: &str, id: &str) -> CoreResult<Uuid> {
        let id = validate::parse_id(id)?;
        if !self.call("delete", self.store.delete(owner_id, id)).await? {
            return Err(CoreError::NotFound { id: id.to_string() });
        }
        info!("deleted transaction {} for {}", id, owner_id);
        Ok(id)
    }

    pub async fn stats(&self, owner_id: &str, query: &StatsQuery) -> CoreResult<StatsReport> {
        let filter = validate::validate_stats(query)?;
        let records = self.call("find", self.store.find(owner_id, &filter.query)).await?;
        debug!("stats for {} over {} records by {}", owner_id, records.len(), filter.group_by);
        Ok(StatsReport::build(&records, filter.group_by))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TransactionKind, TransactionPatch};
    use crate::store::{StoreQuery, TransactionStore};
    use chrono::DateTime;
    use std::time::Duration;
    use crate::types::{ExpenseCategory, PaymentMethod};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};

    fn service() -> TransactionService {
        TransactionService::in_memory(&Config::default())
    }

    fn payload(value: Value) -> TransactionPayload {
        serde_json::from_value(value).unwrap()
    }

    fn lunch() -> TransactionPayload {
        payload(json!({
            "type": "expense",
            "amount": 45.50,
            "category": "Food & Dining",
            "date": "2024-03-01",
            "paymentMethod": "UPI",
            "tags": [],
            "isRecurring": false
        }))
    }

    fn salary(date: &str) -> TransactionPayload {
        payload(json!({
            "type": "income",
            "amount": 100,
            "category": "Salary",
            "date": date
        }))
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let service = service();
        let created = service.create("alice", &lunch()).await.unwrap();

        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(created.amount, dec!(45.5));
        assert_eq!(
            created.kind,
            TransactionKind::Expense {
                category: ExpenseCategory::FoodAndDining,
                payment_method: Some(PaymentMethod::Upi),
            }
        );

        let fetched = service.get_by_id("alice", &created.id.to_string()).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_other_owner_sees_not_found() {
        let service = service();
        let created = service.create("alice", &lunch()).await.unwrap();
        let id = created.id.to_string();

        assert!(matches!(service.get_by_id("bob", &id).await, Err(CoreError::NotFound { .. })));
        let patch = payload(json!({ "amount": 1 }));
        assert!(matches!(service.update("bob", &id, &patch).await, Err(CoreError::NotFound { .. })));
        assert!(matches!(service.delete("bob", &id).await, Err(CoreError::NotFound { .. })));

        assert!(service.get_by_id("alice", &id).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_amount_only() {
        let service = service();
        let created = service.create("alice", &lunch()).await.unwrap();
        let id = created.id.to_string();

        let updated = service.update("alice", &id, &payload(json!({ "amount": 50 }))).await.unwrap();

        assert_eq!(updated.amount, dec!(50));
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.kind, created.kind);
        assert_eq!(updated.date, created.date);
        assert_eq!(updated.tags, created.tags);
        assert_eq!(updated.recurrence, created.recurrence);

        let again = service.update("alice", &id, &payload(json!({ "amount": 51 }))).await.unwrap();
        assert!(again.updated_at > updated.updated_at);
    }

    #[tokio::test]
    async fn test_update_errors() {
        let service = service();
        let created = service.create("alice", &lunch()).await.unwrap();
        let id = created.id.to_string();

        assert!(matches!(
            service.update("alice", &id, &TransactionPayload::default()).await,
            Err(CoreError::EmptyUpdate)
        ));
        assert!(matches!(
            service.update("alice", &id, &payload(json!({ "source": "employer" }))).await,
            Err(CoreError::TypeMismatch { .. })
        ));
        assert!(matches!(
            service.update("alice", &id, &payload(json!({ "amount": "lots" }))).await,
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            service.update("alice", "not-an-id", &payload(json!({ "amount": 1 }))).await,
            Err(CoreError::InvalidId { .. })
        ));

        let unchanged = service.get_by_id("alice", &id).await.unwrap();
        assert_eq!(unchanged, created);
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let service = service();
        let created = service.create("alice", &lunch()).await.unwrap();
        let id = created.id.to_string();

        assert_eq!(service.delete("alice", &id).await.unwrap(), created.id);
        assert!(matches!(service.get_by_id("alice", &id).await, Err(CoreError::NotFound { .. })));
        assert!(matches!(service.delete("alice", &id).await, Err(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_second_page() {
        let service = service();
        for day in 1..=25 {
            service.create("alice", &salary(&format!("2024-01-{:02}", day))).await.unwrap();
        }
        service.create("alice", &lunch()).await.unwrap();
        service.create("bob", &salary("2024-01-01")).await.unwrap();

        let query = ListQuery {
            transaction_type: Some("income".into()),
            page: Some("2".into()),
            limit: Some("10".into()),
            ..Default::default()
        };
        let page = service.list("alice", &query).await.unwrap();

        assert_eq!(page.transactions.len(), 10);
        assert_eq!(page.pagination.total, 25);
        assert_eq!(page.pagination.page, 2);
        assert_eq!(page.pagination.pages, 3);
        assert_eq!(page.transactions[0].date.to_string(), "2024-01-15");
        assert!(page.transactions.iter().all(|t| t.owner_id == "alice"));
    }

    #[tokio::test]
    async fn test_stats_empty_for_new_user() {
        let service = service();
        service.create("alice", &lunch()).await.unwrap();

        let report = service.stats("bob", &StatsQuery::default()).await.unwrap();
        assert!(report.groups.is_empty());
    }

    #[tokio::test]
    async fn test_stats_date_range() {
        let service = service();
        service.create("alice", &salary("2024-01-10")).await.unwrap();
        service.create("alice", &salary("2024-02-10")).await.unwrap();
        service.create("alice", &lunch()).await.unwrap();

        let query = StatsQuery {
            date_from: Some("2024-02-01".into()),
            group_by: Some("month".into()),
            ..Default::default()
        };
        let report = service.stats("alice", &query).await.unwrap();
        let keys: Vec<&str> = report.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-02", "2024-03"]);
        assert_eq!(report.summary.count, 2);
    }

    struct StalledStore;

    #[async_trait]
    impl TransactionStore for StalledStore {
        async fn insert(&self, _record: Transaction) -> StoreResult<Transaction> {
            std::future::pending().await
        }
        async fn find(&self, _owner_id: &str, _query: &StoreQuery) -> StoreResult<Vec<Transaction>> {
            std::future::pending().await
        }
        async fn find_one(&self, _owner_id: &str, _id: Uuid) -> StoreResult<Option<Transaction>> {
            std::future::pending().await
        }
        async fn update(
            &self,
            _owner_id: &str,
            _id: Uuid,
            _patch: &TransactionPatch,
            _now: DateTime<Utc>,
        ) -> StoreResult<UpdateOutcome> {
            std::future::pending().await
        }
        async fn delete(&self, _owner_id: &str, _id: Uuid) -> StoreResult<bool> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_store_timeout_surfaces() {
        let mut config = Config::default();
        config.store.timeout_ms = 20;
        let service = TransactionService::new(Arc::new(StalledStore), &config);

        let err = service.create("alice", &lunch()).await.unwrap_err();
        assert!(matches!(err, CoreError::Store(StoreError::Timeout { operation: "insert" })));
    }

    #[tokio::test]
    async fn test_validation_runs_before_store() {
        let mut config = Config::default();
        config.store.timeout_ms = 20;
        let service = TransactionService::new(Arc::new(StalledStore), &config);

        let err = service.create("alice", &payload(json!({}))).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        let err = service.delete("alice", "nope").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidId { .. }));
    }

    /// Memory store that pauses before every call, widening the window in
    /// which two requests for the same record overlap
    struct SlowStore {
        inner: MemoryStore,
        delay: Duration,
    }

    #[async_trait]
    impl TransactionStore for SlowStore {
        async fn insert(&self, record: Transaction) -> StoreResult<Transaction> {
            self.inner.insert(record).await
        }
        async fn find(&self, owner_id: &str, query: &StoreQuery) -> StoreResult<Vec<Transaction>> {
            tokio::time::sleep(self.delay).await;
            self.inner.find(owner_id, query).await
        }
        async fn find_one(&self, owner_id: &str, id: Uuid) -> StoreResult<Option<Transaction>> {
            let found = self.inner.find_one(owner_id, id).await;
            tokio::time::sleep(self.delay).await;
            found
        }
        async fn update(
            &self,
            owner_id: &str,
            id: Uuid,
            patch: &TransactionPatch,
            now: DateTime<Utc>,
        ) -> StoreResult<UpdateOutcome> {
            tokio::time::sleep(self.delay).await;
            self.inner.update(owner_id, id, patch, now).await
        }
        async fn delete(&self, owner_id: &str, id: Uuid) -> StoreResult<bool> {
            self.inner.delete(owner_id, id).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_updates_keep_both_fields() {
        let store = SlowStore { inner: MemoryStore::new(), delay: Duration::from_millis(50) };
        let service = TransactionService::new(Arc::new(store), &Config::default());
        let created = service.create("alice", &lunch()).await.unwrap();
        let id = created.id.to_string();

        let amount = payload(json!({ "amount": 99 }));
        let description = payload(json!({ "description": "team lunch" }));
        let (first, second) = tokio::join!(
            service.update("alice", &id, &amount),
            service.update("alice", &id, &description),
        );
        let (first, second) = (first.unwrap(), second.unwrap());
        assert_ne!(first.updated_at, second.updated_at);

        let stored = service.get_by_id("alice", &id).await.unwrap();
        assert_eq!(stored.amount, dec!(99));
        assert_eq!(stored.description, "team lunch");
        assert_eq!(stored.updated_at, first.updated_at.max(second.updated_at));
    }

    #[tokio::test]
    async fn test_update_category_from_other_set() {
        let service = service();
        let created = service.create("alice", &lunch()).await.unwrap();
        let id = created.id.to_string();

        let err = service
            .update("alice", &id, &payload(json!({ "category": "Salary" })))
            .await
            .unwrap_err();
        match err {
            CoreError::Validation(errors) => assert_eq!(errors.0[0].field, "category"),
            other => panic!("expected validation error, got {:?}", other),
        }

        let err = service
            .update("alice", &id, &payload(json!({ "type": "income" })))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::TypeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_stats_type_filter() {
        let service = service();
        service.create("alice", &salary("2024-03-05")).await.unwrap();
        service.create("alice", &lunch()).await.unwrap();
        service
            .create(
                "alice",
                &payload(json!({
                    "type": "expense",
                    "amount": 500,
                    "category": "Rent",
                    "date": "2024-03-02"
                })),
            )
            .await
            .unwrap();

        let query = StatsQuery { transaction_type: Some("expense".into()), ..Default::default() };
        let report = service.stats("alice", &query).await.unwrap();

        let keys: Vec<&str> = report.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Rent", "Food & Dining"]);
        assert_eq!(report.summary.total_income, dec!(0));
        assert_eq!(report.summary.total_expense, dec!(545.5));
        assert_eq!(report.summary.net, dec!(-545.5));
        assert_eq!(report.summary.count, 2);
    }
}
