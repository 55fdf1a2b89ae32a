//! Hosted completion API client backing the narrative engine.

use std::time::Duration;

use domain::services::{EngineError, NarrativeEngine};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::NarrativeConfig;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Completion API client.
pub struct CompletionService {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl CompletionService {
    /// Create a client for the configured completion endpoint.
    pub fn new(config: &NarrativeConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to construct completion HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

/// Pull the narrative text out of a chat completion response.
fn extract_narrative(response: ChatResponse) -> Result<String, EngineError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| EngineError::Transport("completion response had no choices".to_string()))
}

#[async_trait::async_trait]
impl NarrativeEngine for CompletionService {
    async fn complete(&self, prompt: &str, max_tokens: Option<u32>) -> Result<String, EngineError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::Transport(format!("completion request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(EngineError::Transport(format!(
                "completion API returned {}: {}",
                status, detail
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Transport(format!("completion response parse failed: {}", e)))?;

        let narrative = extract_narrative(parsed)?;
        debug!(model = %self.model, chars = narrative.len(), "Narrative generated");
        Ok(narrative)
    }
}
