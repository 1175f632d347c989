//! Groq backend (fast OpenAI-compatible inference).

use super::openrouter::map_transport_error;
use super::{GenerateOptions, TextGenerator};
use crate::error::MirageError;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::error;

const BASE_URL: &str = "https://api.groq.com/openai/v1";

pub struct GroqProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GroqProvider {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TextGenerator for GroqProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, MirageError> {
        let response = self
            .client
            .post(format!("{BASE_URL}/chat/completions"))
            .timeout(Duration::from_secs(options.timeout_secs))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": system_prompt},
                    {"role": "user", "content": user_prompt},
                ],
                "temperature": options.temperature,
                "max_tokens": options.max_tokens,
                // Groq supports forced JSON output
                "response_format": {"type": "json_object"},
            }))
            .send()
            .await
            .map_err(|e| map_transport_error(e, options.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            error!("Groq API error: {status}");
            return Err(match status.as_u16() {
                401 => MirageError::BackendAuth(
                    "Invalid Groq API key. Get one at https://console.groq.com/".to_string(),
                ),
                429 => MirageError::BackendTransport(
                    "Groq rate limit exceeded. Free tier: 14,400 requests/day".to_string(),
                ),
                code => MirageError::BackendTransport(format!("Groq API error: {code}")),
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MirageError::BackendTransport(e.to_string()))?;

        data["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                MirageError::ResponseParse("Groq response had no message content".to_string())
            })
    }

    async fn health_check(&self) -> bool {
        let result = self
            .client
            .get(format!("{BASE_URL}/models"))
            .timeout(Duration::from_secs(5))
            .bearer_auth(&self.api_key)
            .send()
            .await;
        matches!(result, Ok(resp) if resp.status().is_success())
    }

    fn name(&self) -> &'static str {
        "groq"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
