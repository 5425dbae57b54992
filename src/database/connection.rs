use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Database, IndexModel};

use crate::errors::Result;
use crate::models::user::User;

const DB_NAME: &str = "equipcertdb";

pub async fn get_db_client(database_url: &str) -> Result<Database> {
    let client = Client::with_uri_str(database_url).await?;
    let db = client.database(DB_NAME);

    match db.list_collection_names().await {
        Ok(collections) => {
            tracing::info!("✅ Connected to database: {}", DB_NAME);
            tracing::info!("📂 Collections found: {:?}", collections);
        }
        Err(e) => {
            tracing::warn!("Database '{}' may not exist yet or is inaccessible: {}", DB_NAME, e);
        }
    }

    Ok(db)
}

/// Unique indexes back the signup duplicate checks; payment and access
/// indexes are owned by their services.
pub async fn ensure_user_indexes(db: &Database) -> Result<()> {
    let users = db.collection::<User>("users");

    let username_index = IndexModel::builder()
        .keys(doc! { "username": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();

    let email_index = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();

    users.create_index(username_index).await?;
    users.create_index(email_index).await?;

    Ok(())
}
