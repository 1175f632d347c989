//! Ollama backend for local models.

use super::openrouter::map_transport_error;
use super::{GenerateOptions, TextGenerator};
use crate::error::MirageError;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::error;

pub struct OllamaProvider {
    host: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(host: &str, model: &str) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, MirageError> {
        // Ollama's generate endpoint takes a single prompt
        let full_prompt = format!("{system_prompt}\n\n{user_prompt}");

        let response = self
            .client
            .post(format!("{}/api/generate", self.host))
            .timeout(Duration::from_secs(options.timeout_secs))
            .json(&json!({
                "model": self.model,
                "prompt": full_prompt,
                "stream": false,
                "options": {
                    "temperature": options.temperature,
                    "num_predict": options.max_tokens,
                },
                "format": "json",
            }))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    MirageError::BackendTransport(format!(
                        "Ollama is not running at {}. Start it with 'ollama serve'",
                        self.host
                    ))
                } else {
                    map_transport_error(e, options.timeout_secs)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Ollama API error: {status}");
            return Err(match status.as_u16() {
                404 => MirageError::BackendTransport(format!(
                    "Model '{}' not found. Pull it first: 'ollama pull {}'",
                    self.model, self.model
                )),
                code => MirageError::BackendTransport(format!("Ollama API error: {code}")),
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MirageError::BackendTransport(e.to_string()))?;

        data["response"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                MirageError::ResponseParse("Ollama response had no text field".to_string())
            })
    }

    async fn health_check(&self) -> bool {
        let result = self
            .client
            .get(format!("{}/api/tags", self.host))
            .timeout(Duration::from_secs(2))
            .send()
            .await;

        let Ok(resp) = result else { return false };
        if !resp.status().is_success() {
            return false;
        }

        // Model must actually be pulled
        let Ok(data) = resp.json::<serde_json::Value>().await else {
            return false;
        };
        let base = self.model.split(':').next().unwrap_or(&self.model);
        data["models"]
            .as_array()
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m["name"].as_str())
                    .any(|name| name.contains(base))
            })
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
