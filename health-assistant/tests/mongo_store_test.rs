//! MongoDB store tests.
//!
//! These need a running MongoDB. Run with:
//! MONGODB_URI=mongodb://localhost:27017 cargo test -p health-assistant --test mongo_store_test -- --ignored

mod common;

use common::biometric_document;
use health_assistant::services::{BiometricStore, MongoBiometricStore};
use mongodb::bson::{doc, DateTime as BsonDateTime};

async fn test_store(collection: &str) -> MongoBiometricStore {
    let uri =
        std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let store = MongoBiometricStore::connect(&uri, "health_assistant_test_db", collection)
        .await
        .expect("Failed to connect to MongoDB");
    store
        .collection()
        .drop(None)
        .await
        .expect("Failed to reset collection");
    store
}

#[tokio::test]
#[ignore]
async fn latest_record_follows_received_at() {
    let store = test_store("latest_record").await;
    store
        .collection()
        .insert_many(
            vec![
                biometric_document(doc! {
                    "userId": "alice",
                    "receivedAt": BsonDateTime::from_millis(2_000),
                    "totalSteps": 2000,
                }),
                biometric_document(doc! {
                    "userId": "alice",
                    "receivedAt": BsonDateTime::from_millis(3_000),
                    "totalSteps": 3000,
                    "bodyTemperature": [{ "temperature": 36.6 }],
                }),
                biometric_document(doc! {
                    "userId": "alice",
                    "receivedAt": BsonDateTime::from_millis(1_000),
                    "totalSteps": 1000,
                }),
            ],
            None,
        )
        .await
        .unwrap();

    let record = store.latest_record("alice").await.unwrap();
    assert_eq!(record.steps, Some(3000));
    assert!(record.body_temperature.is_some());

    let missing = store.latest_record("bob").await.unwrap();
    assert!(missing.is_empty());

    store.health_check().await.unwrap();
    store.close().await;
}

#[tokio::test]
#[ignore]
async fn initialize_indexes_creates_user_received_at_index() {
    let store = test_store("indexes").await;

    store.initialize_indexes().await.unwrap();
    // Creating the same index twice is a no-op.
    store.initialize_indexes().await.unwrap();

    let names = store.collection().list_index_names().await.unwrap();
    assert!(names.contains(&"user_received_at_idx".to_string()));

    store.close().await;
}
