//! `POST /chat`: answer a user's question using their latest biometrics.

use crate::models::{ChatRequest, ChatResponse, ErrorResponse};
use crate::services::metrics;
use crate::services::providers::ProviderError;
use crate::services::StoreError;
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::time::Instant;
use thiserror::Error;

/// Fixed reply for every server-side failure.
pub const APOLOGY_MESSAGE: &str = "Sorry, a server error occurred.";

pub const MISSING_FIELDS_MESSAGE: &str = "userId and prompt are required";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{}", MISSING_FIELDS_MESSAGE)]
    MissingFields,

    #[error("Malformed request body: {0}")]
    MalformedBody(#[from] JsonRejection),

    #[error("Biometric lookup failed: {0}")]
    Lookup(#[from] StoreError),

    #[error("Response generation failed: {0}")]
    Generation(#[from] ProviderError),
}

impl ChatError {
    fn outcome(&self) -> &'static str {
        match self {
            ChatError::MissingFields => "bad_request",
            ChatError::MalformedBody(_) | ChatError::Lookup(_) | ChatError::Generation(_) => {
                "error"
            }
        }
    }
}

fn apology() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ChatResponse {
            response: APOLOGY_MESSAGE.to_string(),
        }),
    )
        .into_response()
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        match self {
            ChatError::MissingFields => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: MISSING_FIELDS_MESSAGE.to_string(),
                }),
            )
                .into_response(),
            ChatError::MalformedBody(rejection) => {
                tracing::warn!(error = %rejection.body_text(), "Rejected malformed chat request");
                apology()
            }
            ChatError::Lookup(e) => {
                tracing::error!(error = %e, "Biometric lookup failed");
                apology()
            }
            ChatError::Generation(e) => {
                tracing::error!(error = %e, error_type = e.kind(), "Health response generation failed");
                apology()
            }
        }
    }
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ChatError> {
    let start = Instant::now();
    let result = answer(&state, payload).await;

    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.outcome(),
    };
    metrics::record_chat_request(outcome, start.elapsed().as_secs_f64());

    result
}

/// One store read, then one generation call.
async fn answer(
    state: &AppState,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ChatError> {
    let Json(request) = payload?;
    let (user_id, prompt) = request
        .required_fields()
        .ok_or(ChatError::MissingFields)?;

    tracing::info!(user_id = %user_id, prompt_len = prompt.len(), "Chat request received");

    let lookup_start = Instant::now();
    let lookup = state.store.latest_record(user_id).await;
    let lookup_result = match &lookup {
        Ok(record) if record.is_empty() => "empty",
        Ok(_) => "found",
        Err(_) => "error",
    };
    metrics::record_biometric_lookup(lookup_result, lookup_start.elapsed().as_secs_f64());
    let record = lookup?;

    tracing::debug!(
        user_id = %user_id,
        has_biometrics = !record.is_empty(),
        "Biometric snapshot loaded"
    );

    let response = state
        .assistant
        .generate_health_response(prompt, &record)
        .await?;

    Ok(Json(ChatResponse { response }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_fields_is_a_client_error() {
        let response = ChatError::MissingFields.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": MISSING_FIELDS_MESSAGE })
        );
    }

    #[tokio::test]
    async fn collaborator_failures_never_leak_details() {
        let errors = [
            ChatError::Lookup(StoreError::Unavailable("mongo at 10.1.2.3 refused".to_string())),
            ChatError::Generation(ProviderError::ApiError("quota for key AIza exceeded".to_string())),
            ChatError::Generation(ProviderError::EmptyResponse),
        ];

        for error in errors {
            let response = error.into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                body_json(response).await,
                serde_json::json!({ "response": APOLOGY_MESSAGE })
            );
        }
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(ChatError::MissingFields.outcome(), "bad_request");
        assert_eq!(
            ChatError::Generation(ProviderError::RateLimited).outcome(),
            "error"
        );
    }
}
