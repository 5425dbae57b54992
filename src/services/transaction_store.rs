// services/transaction_store.rs
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};
use serde_json::Value;
use tracing::error;

use crate::errors::{AppError, Result};
use crate::models::payment::{PaymentRecord, TransactionStatus};

/// Fields written together with a status transition. Everything is
/// applied in one conditional update; there is no partial write.
#[derive(Debug, Clone, Default)]
pub struct TransitionUpdate {
    pub gateway_payload: Option<Value>,
    pub amount_confirmed: Option<i64>,
}

impl TransitionUpdate {
    pub fn payload(payload: Value) -> Self {
        TransitionUpdate {
            gateway_payload: Some(payload),
            amount_confirmed: None,
        }
    }

    pub fn with_confirmed_amount(mut self, amount: i64) -> Self {
        self.amount_confirmed = Some(amount);
        self
    }
}

/// Persistence port for payment attempts. Multiple service instances may
/// write concurrently, so every status change goes through `transition`
/// with an expected-prior-status guard instead of read-modify-write.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Creates the initial `pending` record. Fails with
    /// `DuplicateReference` when the reference is already on file;
    /// references are never reused.
    async fn insert_pending(&self, record: &PaymentRecord) -> Result<()>;

    async fn find_by_reference(&self, reference: &str) -> Result<Option<PaymentRecord>>;

    /// Atomically moves a record to `next` if and only if its current
    /// status is one of `allowed_prior`. Returns the updated record, or
    /// `None` when the precondition no longer holds (a concurrent caller
    /// won the race, or the record is already terminal).
    async fn transition(
        &self,
        reference: &str,
        allowed_prior: &[TransactionStatus],
        next: TransactionStatus,
        update: TransitionUpdate,
    ) -> Result<Option<PaymentRecord>>;

    /// Admin listing, newest first, optionally filtered by status.
    async fn list(
        &self,
        status: Option<TransactionStatus>,
        page: u64,
        limit: i64,
    ) -> Result<(Vec<PaymentRecord>, u64)>;
}

#[derive(Clone)]
pub struct MongoTransactionStore {
    collection: Collection<PaymentRecord>,
}

impl MongoTransactionStore {
    pub fn new(db: &Database) -> Self {
        MongoTransactionStore {
            collection: db.collection("payments"),
        }
    }

    /// Unique index on `reference` backs the idempotency boundary;
    /// the status index serves the admin listing.
    pub async fn init_indexes(&self) -> Result<()> {
        let reference_index = IndexModel::builder()
            .keys(doc! { "reference": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        let status_index = IndexModel::builder()
            .keys(doc! { "status": 1, "created_at": -1 })
            .build();

        self.collection.create_index(reference_index).await?;
        self.collection.create_index(status_index).await?;

        Ok(())
    }
}

#[async_trait]
impl TransactionStore for MongoTransactionStore {
    async fn insert_pending(&self, record: &PaymentRecord) -> Result<()> {
        match self.collection.insert_one(record).await {
            Ok(_) => Ok(()),
            Err(e) if AppError::is_duplicate_key(&e) => Err(AppError::DuplicateReference),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<PaymentRecord>> {
        let record = self
            .collection
            .find_one(doc! { "reference": reference })
            .await?;
        Ok(record)
    }

    async fn transition(
        &self,
        reference: &str,
        allowed_prior: &[TransactionStatus],
        next: TransactionStatus,
        update: TransitionUpdate,
    ) -> Result<Option<PaymentRecord>> {
        let allowed: Vec<&str> = allowed_prior.iter().map(|s| s.as_str()).collect();

        let filter = doc! {
            "reference": reference,
            "status": { "$in": allowed },
        };

        let mut set = doc! {
            "status": next.as_str(),
            "updated_at": bson::DateTime::now(),
        };

        if let Some(payload) = update.gateway_payload {
            let payload = bson::to_bson(&payload).map_err(|e| {
                error!("Failed to convert gateway payload to BSON: {}", e);
                AppError::Backend
            })?;
            set.insert("gateway_payload", payload);
        }

        if let Some(amount) = update.amount_confirmed {
            set.insert("amount_confirmed", amount);
        }

        let updated = self
            .collection
            .find_one_and_update(filter, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?;

        Ok(updated)
    }

    async fn list(
        &self,
        status: Option<TransactionStatus>,
        page: u64,
        limit: i64,
    ) -> Result<(Vec<PaymentRecord>, u64)> {
        let filter = match status {
            Some(status) => doc! { "status": status.as_str() },
            None => doc! {},
        };

        let total = self.collection.count_documents(filter.clone()).await?;

        let skip = page.saturating_sub(1) * limit.max(0) as u64;
        let cursor = self
            .collection
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .skip(skip)
            .limit(limit)
            .await?;

        let records: Vec<PaymentRecord> = cursor.try_collect().await?;

        Ok((records, total))
    }
}

#[cfg(test)]
pub use self::memory::InMemoryTransactionStore;

#[cfg(test)]
mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Store double for orchestrator tests. Mirrors the conditional-update
    /// semantics of the Mongo implementation over a mutexed map.
    #[derive(Default)]
    pub struct InMemoryTransactionStore {
        records: Mutex<HashMap<String, PaymentRecord>>,
    }

    impl InMemoryTransactionStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl TransactionStore for InMemoryTransactionStore {
        async fn insert_pending(&self, record: &PaymentRecord) -> Result<()> {
            let mut records = self.records.lock().unwrap();
            if records.contains_key(&record.reference) {
                return Err(AppError::DuplicateReference);
            }
            records.insert(record.reference.clone(), record.clone());
            Ok(())
        }

        async fn find_by_reference(&self, reference: &str) -> Result<Option<PaymentRecord>> {
            Ok(self.records.lock().unwrap().get(reference).cloned())
        }

        async fn transition(
            &self,
            reference: &str,
            allowed_prior: &[TransactionStatus],
            next: TransactionStatus,
            update: TransitionUpdate,
        ) -> Result<Option<PaymentRecord>> {
            let mut records = self.records.lock().unwrap();
            let Some(record) = records.get_mut(reference) else {
                return Ok(None);
            };
            if !allowed_prior.contains(&record.status) {
                return Ok(None);
            }

            record.status = next;
            record.updated_at = chrono::Utc::now();
            if let Some(payload) = update.gateway_payload {
                record.gateway_payload = Some(payload);
            }
            if let Some(amount) = update.amount_confirmed {
                record.amount_confirmed = Some(amount);
            }

            Ok(Some(record.clone()))
        }

        async fn list(
            &self,
            status: Option<TransactionStatus>,
            _page: u64,
            _limit: i64,
        ) -> Result<(Vec<PaymentRecord>, u64)> {
            let records = self.records.lock().unwrap();
            let matching: Vec<PaymentRecord> = records
                .values()
                .filter(|r| status.map_or(true, |s| r.status == s))
                .cloned()
                .collect();
            let total = matching.len() as u64;
            Ok((matching, total))
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mongodb::bson::doc;
    use serde_json::json;

    use super::*;

    fn pending_record(reference: &str) -> PaymentRecord {
        PaymentRecord {
            id: None,
            reference: reference.to_string(),
            email: "payer@example.com".to_string(),
            amount_requested: 50000,
            amount_confirmed: None,
            status: TransactionStatus::Pending,
            metadata: doc! { "selectedCourse": "Backhoe Operation" },
            gateway_payload: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_rejects_reused_reference() {
        let store = InMemoryTransactionStore::new();
        store.insert_pending(&pending_record("ref-1")).await.unwrap();

        let err = store.insert_pending(&pending_record("ref-1")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateReference));
    }

    #[tokio::test]
    async fn transition_requires_expected_prior_status() {
        let store = InMemoryTransactionStore::new();
        store.insert_pending(&pending_record("ref-2")).await.unwrap();

        let updated = store
            .transition(
                "ref-2",
                &[TransactionStatus::Pending],
                TransactionStatus::Processing,
                TransitionUpdate::payload(json!({"status": "processing"})),
            )
            .await
            .unwrap()
            .expect("pending record should transition");
        assert_eq!(updated.status, TransactionStatus::Processing);

        // A second caller racing on the same precondition loses.
        let lost = store
            .transition(
                "ref-2",
                &[TransactionStatus::Pending],
                TransactionStatus::GatewayInitFailed,
                TransitionUpdate::default(),
            )
            .await
            .unwrap();
        assert!(lost.is_none());
    }

    #[tokio::test]
    async fn terminal_records_never_transition_again() {
        let store = InMemoryTransactionStore::new();
        store.insert_pending(&pending_record("ref-3")).await.unwrap();

        store
            .transition(
                "ref-3",
                &[TransactionStatus::Pending],
                TransactionStatus::Success,
                TransitionUpdate::payload(json!({})).with_confirmed_amount(50000),
            )
            .await
            .unwrap()
            .expect("transition to success");

        let denied = store
            .transition(
                "ref-3",
                &[
                    TransactionStatus::Pending,
                    TransactionStatus::AwaitingAuthorization,
                    TransactionStatus::Processing,
                ],
                TransactionStatus::GatewayVerifyFailed,
                TransitionUpdate::default(),
            )
            .await
            .unwrap();
        assert!(denied.is_none());

        let record = store.find_by_reference("ref-3").await.unwrap().unwrap();
        assert_eq!(record.status, TransactionStatus::Success);
        assert_eq!(record.amount_confirmed, Some(50000));
    }

    #[tokio::test]
    async fn transition_on_unknown_reference_is_none() {
        let store = InMemoryTransactionStore::new();
        let result = store
            .transition(
                "ghost",
                &[TransactionStatus::Pending],
                TransactionStatus::Processing,
                TransitionUpdate::default(),
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
