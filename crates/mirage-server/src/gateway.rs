//! Provider gateway: primary backend selection, bounded calls, and the
//! deterministic fallback chain.
//!
//! The primary backend is chosen once at startup. A configured backend whose
//! credentials are missing downgrades to the synthetic engine with a warning;
//! startup never fails over provider configuration. At request time the primary
//! call is bounded by a timeout, and any recoverable failure delegates to the
//! synthetic engine when fallback is enabled.

use crate::config::{ProviderKind, Settings};
use crate::error::MirageError;
use crate::providers::{
    build_user_prompt, GenerateOptions, GroqProvider, OllamaProvider, OpenRouterProvider,
    TextGenerator, SYSTEM_PROMPT,
};
use crate::providers::parse::parse_generated_text;
use crate::synthetic::SyntheticEngine;
use crate::types::{ContextEntry, MockResponse, ProviderStatus, RequestDescriptor};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct ProviderGateway {
    primary: Option<Arc<dyn TextGenerator>>,
    synthetic: SyntheticEngine,
    options: GenerateOptions,
    fallback_enabled: bool,
    configured: ProviderKind,
}

impl ProviderGateway {
    /// Select the active backend from settings. Missing credentials downgrade
    /// to the synthetic engine rather than failing startup.
    pub fn from_settings(settings: &Settings) -> Self {
        let primary: Option<Arc<dyn TextGenerator>> = match settings.provider {
            ProviderKind::Openrouter => match &settings.openrouter_api_key {
                Some(key) => {
                    info!("Using DeepSeek via OpenRouter ({})", settings.openrouter_model);
                    Some(Arc::new(OpenRouterProvider::new(
                        key,
                        &settings.openrouter_model,
                    )))
                }
                None => {
                    warn!(
                        "OpenRouter selected but MIRAGE_OPENROUTER_API_KEY not set. \
                         Falling back to synthetic mode. Get a free key at https://openrouter.ai/"
                    );
                    None
                }
            },
            ProviderKind::Groq => match &settings.groq_api_key {
                Some(key) => {
                    info!("Using Groq ({})", settings.groq_model);
                    Some(Arc::new(GroqProvider::new(key, &settings.groq_model)))
                }
                None => {
                    warn!(
                        "Groq selected but MIRAGE_GROQ_API_KEY not set. \
                         Falling back to synthetic mode."
                    );
                    None
                }
            },
            ProviderKind::Ollama => {
                info!(
                    "Using Ollama at {} ({})",
                    settings.ollama_host, settings.ollama_model
                );
                Some(Arc::new(OllamaProvider::new(
                    &settings.ollama_host,
                    &settings.ollama_model,
                )))
            }
            ProviderKind::Synthetic => {
                info!("Using synthetic mode (template-based responses)");
                None
            }
        };

        Self {
            primary,
            synthetic: SyntheticEngine::new(),
            options: GenerateOptions {
                temperature: settings.temperature,
                max_tokens: settings.max_tokens,
                timeout_secs: settings.ai_timeout_secs,
            },
            fallback_enabled: settings.auto_fallback,
            configured: settings.provider,
        }
    }

    /// Gateway backed only by the synthetic engine. Used by tests and as the
    /// degenerate configuration.
    pub fn synthetic_only() -> Self {
        Self {
            primary: None,
            synthetic: SyntheticEngine::new(),
            options: GenerateOptions::default(),
            fallback_enabled: true,
            configured: ProviderKind::Synthetic,
        }
    }

    /// Gateway with an explicit primary backend; used by tests.
    pub fn with_primary(primary: Arc<dyn TextGenerator>, fallback_enabled: bool) -> Self {
        Self {
            primary: Some(primary),
            synthetic: SyntheticEngine::new(),
            options: GenerateOptions::default(),
            fallback_enabled,
            configured: ProviderKind::Synthetic,
        }
    }

    /// Generate a mock response for the request.
    ///
    /// An `Err` is only possible when fallback is disabled; with fallback on,
    /// every failure path lands in the synthetic engine.
    pub async fn generate(
        &self,
        descriptor: &RequestDescriptor,
        context: &[ContextEntry],
    ) -> Result<MockResponse, MirageError> {
        let Some(primary) = &self.primary else {
            return Ok(self.synthetic.generate(descriptor, context));
        };

        match self.call_primary(primary.as_ref(), descriptor, context).await {
            Ok(response) => Ok(response),
            Err(e) if e.is_recoverable() && self.fallback_enabled => {
                warn!("{} backend failed ({e}), using synthetic fallback", primary.name());
                Ok(self.synthetic.generate(descriptor, context))
            }
            Err(e) => Err(e),
        }
    }

    async fn call_primary(
        &self,
        primary: &dyn TextGenerator,
        descriptor: &RequestDescriptor,
        context: &[ContextEntry],
    ) -> Result<MockResponse, MirageError> {
        let user_prompt = build_user_prompt(descriptor, context);

        // Outer bound in case the backend's own timeout misbehaves; the
        // in-flight call is abandoned, not retried.
        let text = tokio::time::timeout(
            Duration::from_secs(self.options.timeout_secs),
            primary.generate(SYSTEM_PROMPT, &user_prompt, &self.options),
        )
        .await
        .map_err(|_| MirageError::BackendTimeout(self.options.timeout_secs))??;

        let envelope = parse_generated_text(&text);
        Ok(MockResponse::from_envelope(envelope))
    }

    /// Status snapshot: configured backend, model, and per-backend
    /// availability probes. Recomputed on every call, never persisted.
    pub async fn status(&self) -> ProviderStatus {
        let mut available = HashMap::new();
        available.insert("synthetic".to_string(), true);
        if let Some(primary) = &self.primary {
            available.insert(primary.name().to_string(), primary.health_check().await);
        }

        ProviderStatus {
            provider: self.configured.to_string(),
            model: self
                .primary
                .as_ref()
                .map(|p| p.model().to_string())
                .unwrap_or_else(|| "template-based".to_string()),
            fallback_enabled: self.fallback_enabled,
            available_providers: available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted backend returning a fixed result and counting invocations.
    struct ScriptedBackend {
        result: Result<String, ()>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                result: Err(()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedBackend {
        async fn generate(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _options: &GenerateOptions,
        ) -> Result<String, MirageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(MirageError::BackendTransport("connection reset".into())),
            }
        }

        async fn health_check(&self) -> bool {
            self.result.is_ok()
        }

        fn name(&self) -> &'static str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-model"
        }
    }

    fn descriptor() -> RequestDescriptor {
        RequestDescriptor::new("GET", "/users", None, None)
    }

    #[tokio::test]
    async fn test_primary_success_parsed_and_normalized() {
        let backend = ScriptedBackend::ok(r#"{"status_code": 200, "body": {"id": 1}}"#);
        let gateway = ProviderGateway::with_primary(backend.clone(), true);

        let resp = gateway.generate(&descriptor(), &[]).await.unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body, json!({"id": 1}));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unparseable_output_wrapped_as_500() {
        let backend = ScriptedBackend::ok("sorry, I can only answer questions");
        let gateway = ProviderGateway::with_primary(backend, true);

        let resp = gateway.generate(&descriptor(), &[]).await.unwrap();
        assert_eq!(resp.status_code, 500);
        assert!(resp.body["raw_response"].is_string());
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_synthetic() {
        let backend = ScriptedBackend::failing();
        let gateway = ProviderGateway::with_primary(backend, true);

        let resp = gateway.generate(&descriptor(), &[]).await.unwrap();
        // Synthetic LIST response, never an error
        assert_eq!(resp.status_code, 200);
        assert!(resp.body["users"].is_array());
    }

    #[tokio::test]
    async fn test_failure_surfaces_when_fallback_disabled() {
        let backend = ScriptedBackend::failing();
        let gateway = ProviderGateway::with_primary(backend, false);

        let err = gateway.generate(&descriptor(), &[]).await.unwrap_err();
        assert!(matches!(err, MirageError::BackendTransport(_)));
    }

    #[tokio::test]
    async fn test_missing_credentials_select_synthetic() {
        let mut settings = Settings::default();
        settings.provider = ProviderKind::Groq;
        settings.groq_api_key = None;

        let gateway = ProviderGateway::from_settings(&settings);
        let resp = gateway.generate(&descriptor(), &[]).await.unwrap();
        assert_eq!(resp.status_code, 200);
    }

    #[tokio::test]
    async fn test_status_snapshot() {
        let gateway = ProviderGateway::with_primary(ScriptedBackend::ok("{}"), true);
        let status = gateway.status().await;
        assert_eq!(status.model, "scripted-model");
        assert!(status.fallback_enabled);
        assert_eq!(status.available_providers.get("synthetic"), Some(&true));
        assert_eq!(status.available_providers.get("scripted"), Some(&true));
    }
}
