//! Request and response bodies of the `/chat` route.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

impl ChatRequest {
    /// The user id and trimmed prompt, or `None` when either is empty.
    ///
    /// The user id is taken as sent; only the prompt is trimmed.
    pub fn required_fields(&self) -> Option<(&str, &str)> {
        let user_id = self.user_id.as_deref().filter(|id| !id.is_empty())?;
        let prompt = self.prompt.as_deref().map(str::trim).filter(|p| !p.is_empty())?;
        Some((user_id, prompt))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
