//! Text generation backends.
//!
//! Every backend speaks the same narrow contract: take a system prompt and a
//! user prompt, return raw text. The backends are a closed set selected once at
//! startup; output parsing lives in [`parse`] because no backend can be trusted
//! to return structured JSON.

mod groq;
mod ollama;
mod openrouter;
pub mod parse;

use crate::error::MirageError;
use crate::types::{ContextEntry, RequestDescriptor};
use async_trait::async_trait;
use serde::Serialize;

pub use groq::GroqProvider;
pub use ollama::OllamaProvider;
pub use openrouter::OpenRouterProvider;

/// Tuning knobs passed to every generation call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2000,
            timeout_secs: 30,
        }
    }
}

/// Capability interface shared by all generation backends.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate raw text for the given prompts.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, MirageError>;

    /// Probe whether the backend is reachable and usable.
    async fn health_check(&self) -> bool;

    /// Short backend name for logging and status reports.
    fn name(&self) -> &'static str;

    /// Model identifier currently in use.
    fn model(&self) -> &str;
}

/// System prompt shared by all backends.
pub const SYSTEM_PROMPT: &str = "\
You are Mirage, an intelligent API mocking engine.
Generate realistic JSON responses for API requests.

Rules:
1. Analyze the HTTP method and path
2. Generate realistic data (use real names, emails, dates)
3. Follow REST standards (GET -> array or object, POST -> 201, DELETE -> 204)
4. Use data from request body when provided
5. Keep responses consistent with context

Output ONLY valid JSON in this format:
{
  \"status_code\": <int>,
  \"headers\": {\"Content-Type\": \"application/json\"},
  \"body\": <json_data>
}";

/// Build the user prompt describing the request and recent session history.
pub fn build_user_prompt(descriptor: &RequestDescriptor, context: &[ContextEntry]) -> String {
    let mut parts = vec![
        format!("Method: {}", descriptor.method),
        format!("Path: {}", descriptor.path),
    ];

    if let Some(body) = &descriptor.body {
        let rendered = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
        parts.push(format!("Request Body:\n{rendered}"));
    }

    if !context.is_empty() {
        let lines: Vec<String> = context
            .iter()
            .map(|entry| format!("- {} {}", entry.method, entry.path))
            .collect();
        parts.push(format!("Recent Context:\n{}", lines.join("\n")));
    }

    parts.push("\nGenerate appropriate JSON response:".to_string());
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MockResponse;
    use serde_json::json;

    #[test]
    fn test_user_prompt_includes_request_line() {
        let desc = RequestDescriptor::new("GET", "/api/users", None, None);
        let prompt = build_user_prompt(&desc, &[]);
        assert!(prompt.contains("Method: GET"));
        assert!(prompt.contains("Path: /api/users"));
        assert!(!prompt.contains("Recent Context"));
    }

    #[test]
    fn test_user_prompt_includes_body_and_context() {
        let desc =
            RequestDescriptor::new("POST", "/users", Some(json!({"name": "Alice"})), None);
        let prior = ContextEntry::from_exchange(
            &RequestDescriptor::new("GET", "/users", None, None),
            &MockResponse::new(200, json!({})),
        );
        let prompt = build_user_prompt(&desc, &[prior]);
        assert!(prompt.contains("Request Body"));
        assert!(prompt.contains("Alice"));
        assert!(prompt.contains("- GET /users"));
    }
}
