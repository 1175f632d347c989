//! Mirage: AI-assisted mock API server.
//!
//! Turns any inbound HTTP request into a plausible JSON response, as if a real
//! backend existed for that endpoint. The pipeline classifies the request,
//! consults a fingerprint cache and per-session history, asks the configured
//! generation backend (falling back to a deterministic synthetic engine), and
//! records the exchange for later schema inference.

pub mod cache;
pub mod classifier;
pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod pipeline;
pub mod providers;
pub mod server;
pub mod specgen;
pub mod store;
pub mod synthetic;
pub mod traffic;
pub mod types;
