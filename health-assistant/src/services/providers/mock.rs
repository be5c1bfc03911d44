//! Mock provider implementation for testing.

use super::{FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy)]
enum Behavior {
    Echo,
    Fail,
    Empty,
}

/// Mock text provider for testing.
///
/// Records every prompt it receives so tests can inspect what the model
/// would have been sent.
pub struct MockTextProvider {
    behavior: Behavior,
    prompts: Mutex<Vec<String>>,
}

impl MockTextProvider {
    /// Answers every prompt with `Mock response for: <prompt>`.
    pub fn new() -> Self {
        Self::with_behavior(Behavior::Echo)
    }

    /// Fails every call with an API error.
    pub fn failing() -> Self {
        Self::with_behavior(Behavior::Fail)
    }

    /// Succeeds without producing any text.
    pub fn empty() -> Self {
        Self::with_behavior(Behavior::Empty)
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, oldest first.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

impl Default for MockTextProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.prompts.lock().await.push(prompt.to_string());

        let text = match self.behavior {
            Behavior::Echo => Some(format!("Mock response for: {}", prompt)),
            Behavior::Empty => None,
            Behavior::Fail => {
                return Err(ProviderError::ApiError(
                    "mock provider quota exhausted".to_string(),
                ))
            }
        };

        Ok(ProviderResponse {
            text,
            input_tokens: prompt.len() as i32 / 4,
            output_tokens: 10,
            finish_reason: FinishReason::Complete,
        })
    }
}
