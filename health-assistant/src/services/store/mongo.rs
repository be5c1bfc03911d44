//! MongoDB-backed biometric store.

use super::{BiometricStore, StoreError};
use crate::models::BiometricDocument;
use async_trait::async_trait;
use mongodb::{
    bson::doc,
    options::{FindOneOptions, IndexOptions},
    Client as MongoClient, Collection, IndexModel,
};
use service_core::error::AppError;

/// Handle on the biometric collection.
///
/// Opened once at startup with [`MongoBiometricStore::connect`], shared by
/// every request, and released with [`MongoBiometricStore::close`].
#[derive(Clone)]
pub struct MongoBiometricStore {
    client: MongoClient,
    collection: Collection<BiometricDocument>,
}

impl MongoBiometricStore {
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let collection = client.database(database).collection(collection);
        tracing::info!(
            database = %database,
            collection = %collection.name(),
            "Successfully connected to MongoDB database"
        );
        Ok(Self { client, collection })
    }

    /// Create the index serving "latest document for a user".
    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        let latest_index = IndexModel::builder()
            .keys(doc! { "userId": 1, "receivedAt": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_received_at_idx".to_string())
                    .build(),
            )
            .build();

        self.collection
            .create_index(latest_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create user_received_at index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        tracing::info!("Successfully created biometric indexes");
        Ok(())
    }

    pub fn collection(&self) -> &Collection<BiometricDocument> {
        &self.collection
    }

    /// Close pooled connections. Outstanding clones of this handle must be
    /// dropped first.
    pub async fn close(self) {
        tracing::info!("Closing MongoDB connection");
        self.client.shutdown().await;
    }
}

#[async_trait]
impl BiometricStore for MongoBiometricStore {
    async fn latest_document(
        &self,
        user_id: &str,
    ) -> Result<Option<BiometricDocument>, StoreError> {
        let options = FindOneOptions::builder()
            .sort(doc! { "receivedAt": -1 })
            .build();

        self.collection
            .find_one(doc! { "userId": user_id }, options)
            .await
            .map_err(|e| {
                tracing::error!("Failed to query latest biometric document: {}", e);
                StoreError::Query(e.to_string())
            })
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                StoreError::Unavailable(e.to_string())
            })?;
        Ok(())
    }
}
