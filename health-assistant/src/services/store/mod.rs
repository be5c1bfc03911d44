//! Biometric store abstraction.
//!
//! The chat flow only needs "latest document for a user". The MongoDB
//! implementation backs the running service; the in-memory one backs tests.

pub mod memory;
pub mod mongo;

pub use memory::InMemoryBiometricStore;
pub use mongo::MongoBiometricStore;

use crate::models::{BiometricDocument, BiometricRecord};
use async_trait::async_trait;
use thiserror::Error;

/// Error type for store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),
}

#[async_trait]
pub trait BiometricStore: Send + Sync {
    /// The document with the greatest `receivedAt` for `user_id`, if any.
    async fn latest_document(&self, user_id: &str)
        -> Result<Option<BiometricDocument>, StoreError>;

    /// Ping the backing store.
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Flattened snapshot of the latest document. A user without documents
    /// yields the empty record, not an error.
    async fn latest_record(&self, user_id: &str) -> Result<BiometricRecord, StoreError> {
        let record = self
            .latest_document(user_id)
            .await?
            .map(|doc| BiometricRecord::from_document(&doc))
            .unwrap_or_else(BiometricRecord::empty);
        Ok(record)
    }
}
