#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use health_assistant::models::BiometricDocument;
use health_assistant::services::providers::mock::MockTextProvider;
use health_assistant::services::{BiometricStore, HealthAssistant, InMemoryBiometricStore};
use health_assistant::startup::{build_router, AppState};
use mongodb::bson::{self, Document};
use std::sync::Arc;

/// Router wired to the given store and a recording mock provider.
pub fn test_app(
    store: impl BiometricStore + 'static,
    provider: Arc<MockTextProvider>,
) -> axum::Router {
    let assistant = HealthAssistant::new(provider, 0.7, 1024);
    build_router(AppState::new(Arc::new(store), assistant))
}

pub fn empty_app() -> (axum::Router, Arc<MockTextProvider>) {
    let provider = Arc::new(MockTextProvider::new());
    (test_app(InMemoryBiometricStore::new(), provider.clone()), provider)
}

pub fn biometric_document(raw: Document) -> BiometricDocument {
    bson::from_document(raw).expect("valid biometric document")
}

pub fn chat_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
