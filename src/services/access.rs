// services/access.rs
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};
use tracing::info;

use crate::errors::Result;
use crate::models::payment::{AccessRecord, PaymentOutcome};

/// Durable side of the paid-content gate. The flag is granted exactly
/// once per payer and only ever from a confirmed `success` outcome;
/// clients restore it on start via `is_paid`.
#[derive(Clone)]
pub struct AccessGate {
    collection: Collection<AccessRecord>,
}

impl AccessGate {
    pub fn new(db: &Database) -> Self {
        AccessGate {
            collection: db.collection("course_access"),
        }
    }

    pub async fn init_indexes(&self) -> Result<()> {
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection.create_index(email_index).await?;
        Ok(())
    }

    /// Grants access when, and only when, the orchestrator reports an
    /// explicit success. Any other outcome leaves the flag untouched.
    pub async fn grant_on(&self, outcome: &PaymentOutcome, email: &str, reference: &str) -> Result<bool> {
        if !outcome.is_success() {
            return Ok(false);
        }

        let filter = doc! { "email": email };
        let update = doc! {
            "$setOnInsert": {
                "email": email,
                "reference": reference,
                "granted_at": mongodb::bson::DateTime::now(),
            }
        };

        self.collection
            .update_one(filter, update)
            .upsert(true)
            .await?;

        info!("Course access granted to {} via {}", email, reference);
        Ok(true)
    }

    pub async fn is_paid(&self, email: &str) -> Result<bool> {
        let record = self.collection.find_one(doc! { "email": email }).await?;
        Ok(record.is_some())
    }
}
