//! Health assistant: turns a question and a biometric snapshot into an answer.

use super::metrics;
use super::prompt::{render_user_prompt, SYSTEM_INSTRUCTION};
use super::providers::{GenerationParams, ProviderError, TextProvider};
use crate::models::BiometricRecord;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct HealthAssistant {
    provider: Arc<dyn TextProvider>,
    params: GenerationParams,
}

impl HealthAssistant {
    pub fn new(provider: Arc<dyn TextProvider>, temperature: f32, max_output_tokens: i32) -> Self {
        Self {
            provider,
            params: GenerationParams {
                system_instruction: Some(SYSTEM_INSTRUCTION.to_string()),
                temperature: Some(temperature),
                max_tokens: Some(max_output_tokens),
            },
        }
    }

    /// Generate the answer for `prompt`, grounded on `record`.
    ///
    /// An empty record still produces an answer; the model is told no data
    /// is available. A reply without text is an error.
    pub async fn generate_health_response(
        &self,
        prompt: &str,
        record: &BiometricRecord,
    ) -> Result<String, ProviderError> {
        let user_prompt = render_user_prompt(prompt, record);
        let provider = self.provider.name();
        let model = self.provider.model();

        let start = Instant::now();
        let result = self.provider.generate(&user_prompt, &self.params).await;
        metrics::record_provider_latency(provider, model, start.elapsed().as_secs_f64());

        let response = result.inspect_err(|e| {
            metrics::record_provider_error(provider, e.kind());
        })?;

        tracing::info!(
            provider = %provider,
            model = %model,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            finish_reason = ?response.finish_reason,
            "Generated health response"
        );

        response.text.ok_or_else(|| {
            metrics::record_provider_error(provider, ProviderError::EmptyResponse.kind());
            ProviderError::EmptyResponse
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::prompt::NO_BIOMETRIC_DATA;
    use crate::services::providers::mock::MockTextProvider;

    #[tokio::test]
    async fn empty_record_still_calls_the_provider() {
        let provider = Arc::new(MockTextProvider::new());
        let assistant = HealthAssistant::new(provider.clone(), 0.7, 512);

        let answer = assistant
            .generate_health_response("Should I rest today?", &BiometricRecord::empty())
            .await
            .unwrap();

        let prompts = provider.prompts().await;
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(NO_BIOMETRIC_DATA));
        assert!(prompts[0].ends_with("User question: Should I rest today?"));
        assert!(answer.starts_with("Mock response for: "));
    }

    #[tokio::test]
    async fn provider_failure_is_returned() {
        let assistant = HealthAssistant::new(Arc::new(MockTextProvider::failing()), 0.7, 512);
        let result = assistant
            .generate_health_response("hi", &BiometricRecord::empty())
            .await;
        assert!(matches!(result, Err(ProviderError::ApiError(_))));
    }

    #[tokio::test]
    async fn reply_without_text_is_an_error() {
        let assistant = HealthAssistant::new(Arc::new(MockTextProvider::empty()), 0.7, 512);
        let result = assistant
            .generate_health_response("hi", &BiometricRecord::empty())
            .await;
        assert!(matches!(result, Err(ProviderError::EmptyResponse)));
    }
}
