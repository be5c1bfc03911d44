//! In-memory biometric store for tests and local runs.

use super::{BiometricStore, StoreError};
use crate::models::BiometricDocument;
use async_trait::async_trait;
use mongodb::bson::Bson;
use std::cmp::Ordering;
use tokio::sync::RwLock;

/// Keeps documents in insertion order and answers like the MongoDB store.
#[derive(Default)]
pub struct InMemoryBiometricStore {
    documents: RwLock<Vec<BiometricDocument>>,
    unavailable: bool,
}

impl InMemoryBiometricStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<BiometricDocument>) -> Self {
        Self {
            documents: RwLock::new(documents),
            unavailable: false,
        }
    }

    /// A store whose every call fails, as if the database were down.
    pub fn unavailable() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            unavailable: true,
        }
    }

    pub async fn insert(&self, document: BiometricDocument) {
        self.documents.write().await.push(document);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

/// Position of a value's type in MongoDB's cross-type sort order. A missing
/// field sorts like null.
fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        None | Some(Bson::Null) | Some(Bson::Undefined) => 1,
        Some(Bson::MinKey) => 0,
        Some(
            Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_),
        ) => 2,
        Some(Bson::String(_) | Bson::Symbol(_)) => 3,
        Some(Bson::Document(_)) => 4,
        Some(Bson::Array(_)) => 5,
        Some(Bson::Binary(_)) => 6,
        Some(Bson::ObjectId(_)) => 7,
        Some(Bson::Boolean(_)) => 8,
        Some(Bson::DateTime(_)) => 9,
        Some(Bson::Timestamp(_)) => 10,
        Some(Bson::RegularExpression(_)) => 11,
        Some(Bson::MaxKey) => 13,
        Some(_) => 12,
    }
}

fn numeric(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        Bson::Decimal128(d) => d.to_string().parse().ok(),
        _ => None,
    }
}

/// Orders `receivedAt` values the way a MongoDB sort on the field would.
fn compare_received_at(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    type_rank(a).cmp(&type_rank(b)).then_with(|| match (a, b) {
        (Some(Bson::DateTime(x)), Some(Bson::DateTime(y))) => x.cmp(y),
        (Some(Bson::String(x)), Some(Bson::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => match (numeric(x), numeric(y)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        _ => Ordering::Equal,
    })
}

#[async_trait]
impl BiometricStore for InMemoryBiometricStore {
    async fn latest_document(
        &self,
        user_id: &str,
    ) -> Result<Option<BiometricDocument>, StoreError> {
        self.check_available()?;

        let documents = self.documents.read().await;
        let latest = documents
            .iter()
            .filter(|doc| doc.user_id.as_deref() == Some(user_id))
            .max_by(|a, b| compare_received_at(a.received_at.as_ref(), b.received_at.as_ref()))
            .cloned();
        Ok(latest)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}
