use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use super::TextGenerator;
use crate::config::GenerationConfig;

/// Sampling temperature is pinned so identical input yields identical output.
const TEMPERATURE: f32 = 0.0;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Generator for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAIChatGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAIChatGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .context("Failed to build generation HTTP client")?;
        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));

        info!(
            "Initialized chat generator with endpoint: {} (model {})",
            endpoint, config.model
        );

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.trim().to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAIChatGenerator {
    fn name(&self) -> &'static str {
        "OpenAI-compatible chat"
    }

    async fn generate(&self, system_prompt: &str, user_content: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
            temperature: TEMPERATURE,
        };

        debug!(
            "Sending chat completion request ({} chars of content)",
            user_content.len()
        );

        let mut request = self.client.post(&self.endpoint).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .context("Failed to send chat completion request")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read chat completion response body")?;

        if !status.is_success() {
            error!(
                "Chat completion failed with status {}: {}",
                status, response_text
            );

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&response_text) {
                return Err(anyhow::anyhow!(
                    "Chat completion error: {}",
                    error_response.error.message
                ));
            }

            return Err(anyhow::anyhow!(
                "Chat completion failed with status {}: {}",
                status,
                response_text
            ));
        }

        let parsed: ChatResponse = serde_json::from_str(&response_text)
            .context("Failed to parse chat completion response")?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Chat completion returned no content"))?;

        info!("Generation complete: {} chars", text.len());
        Ok(text)
    }
}
