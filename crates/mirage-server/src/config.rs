//! Runtime settings for the Mirage server.
//!
//! Everything is a CLI flag with an environment-variable override so the server
//! configures cleanly in containers. `mirage-server --help` documents the set.

use crate::store::StoreBackend;
use clap::{ArgAction, Parser, ValueEnum};

/// Generation backends. A closed set, selected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    /// DeepSeek models via OpenRouter (requires API key)
    Openrouter,
    /// Groq fast inference (requires API key)
    Groq,
    /// Local Ollama server
    Ollama,
    /// Template-based generation, no external backend
    Synthetic,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProviderKind::Openrouter => "openrouter",
            ProviderKind::Groq => "groq",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Synthetic => "synthetic",
        };
        f.write_str(name)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "mirage-server",
    about = "AI-assisted mock API server: plausible JSON responses for any endpoint"
)]
pub struct Settings {
    /// Address to bind the HTTP server to
    #[arg(long, env = "MIRAGE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(short, long, env = "MIRAGE_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Primary generation backend
    #[arg(long, env = "MIRAGE_AI_PROVIDER", value_enum, default_value_t = ProviderKind::Synthetic)]
    pub provider: ProviderKind,

    #[arg(long, env = "MIRAGE_OPENROUTER_API_KEY", hide_env_values = true)]
    pub openrouter_api_key: Option<String>,

    #[arg(
        long,
        env = "MIRAGE_OPENROUTER_MODEL",
        default_value = "deepseek/deepseek-chat"
    )]
    pub openrouter_model: String,

    #[arg(long, env = "MIRAGE_GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    #[arg(
        long,
        env = "MIRAGE_GROQ_MODEL",
        default_value = "llama-3.1-70b-versatile"
    )]
    pub groq_model: String,

    #[arg(
        long,
        env = "MIRAGE_OLLAMA_HOST",
        default_value = "http://localhost:11434"
    )]
    pub ollama_host: String,

    #[arg(long, env = "MIRAGE_OLLAMA_MODEL", default_value = "llama3")]
    pub ollama_model: String,

    #[arg(long, env = "MIRAGE_AI_TEMPERATURE", default_value_t = 0.7)]
    pub temperature: f32,

    #[arg(long, env = "MIRAGE_AI_MAX_TOKENS", default_value_t = 2000)]
    pub max_tokens: u32,

    /// Bound on each primary backend call, in seconds
    #[arg(long, env = "MIRAGE_AI_TIMEOUT", default_value_t = 30)]
    pub ai_timeout_secs: u64,

    /// Fall back to the synthetic generator when the backend fails
    #[arg(
        long,
        env = "MIRAGE_AI_AUTO_FALLBACK",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub auto_fallback: bool,

    /// Storage backend for cache, context and traffic logs
    #[arg(long, env = "MIRAGE_STORE", value_enum, default_value_t = StoreBackend::InMemory)]
    pub store: StoreBackend,

    #[arg(long, env = "MIRAGE_REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub redis_url: String,

    /// Response cache TTL in seconds
    #[arg(long, env = "MIRAGE_CACHE_TTL", default_value_t = 86_400)]
    pub cache_ttl_secs: u64,

    /// Session context TTL in seconds, independent of the cache TTL
    #[arg(long, env = "MIRAGE_CONTEXT_TTL", default_value_t = 3_600)]
    pub context_ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self::parse_from(["mirage-server"])
    }
}
