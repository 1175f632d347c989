//! End-to-end pipeline tests against the in-memory store.

use async_trait::async_trait;
use mirage_server::cache::ResponseCache;
use mirage_server::context::SessionContextStore;
use mirage_server::error::MirageError;
use mirage_server::gateway::ProviderGateway;
use mirage_server::pipeline::MockPipeline;
use mirage_server::providers::{GenerateOptions, TextGenerator};
use mirage_server::store::{InMemoryStore, KeyValueStore};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Backend that counts invocations and returns a fixed JSON envelope.
struct CountingBackend {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TextGenerator for CountingBackend {
    async fn generate(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _options: &GenerateOptions,
    ) -> Result<String, MirageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(r#"{"status_code": 200, "body": {"generated": true}}"#.to_string())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "counting"
    }

    fn model(&self) -> &str {
        "counting-model"
    }
}

fn synthetic_pipeline() -> MockPipeline {
    let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
    MockPipeline::new(
        ResponseCache::new(store.clone(), 3600),
        SessionContextStore::new(store, 3600),
        ProviderGateway::synthetic_only(),
    )
}

fn counting_pipeline(calls: Arc<AtomicUsize>) -> MockPipeline {
    let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
    MockPipeline::new(
        ResponseCache::new(store.clone(), 3600),
        SessionContextStore::new(store, 3600),
        ProviderGateway::with_primary(Arc::new(CountingBackend { calls }), true),
    )
}

fn descriptor(
    method: &str,
    path: &str,
    body: Option<serde_json::Value>,
    session: &str,
) -> mirage_server::types::RequestDescriptor {
    mirage_server::types::RequestDescriptor::new(method, path, body, Some(session))
}

#[tokio::test]
async fn cache_hit_suppresses_recomputation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = counting_pipeline(calls.clone());
    let desc = descriptor("POST", "/widgets", Some(json!({"a": 1})), "s1");

    let first = pipeline.handle(&desc).await;
    let second = pipeline.handle(&desc).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
}

#[tokio::test]
async fn distinct_bodies_miss_the_cache() {
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = counting_pipeline(calls.clone());

    pipeline
        .handle(&descriptor("POST", "/widgets", Some(json!({"a": 1})), "s1"))
        .await;
    pipeline
        .handle(&descriptor("POST", "/widgets", Some(json!({"a": 2})), "s1"))
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn created_item_reappears_in_list() {
    let pipeline = synthetic_pipeline();

    let created = pipeline
        .handle(&descriptor(
            "POST",
            "/products",
            Some(json!({"name": "Anvil"})),
            "s1",
        ))
        .await;
    assert_eq!(created.status_code, 201);

    let listed = pipeline
        .handle(&descriptor("GET", "/products", None, "s1"))
        .await;
    let items = listed.body["products"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], json!("Anvil"));
}

#[tokio::test]
async fn update_merges_and_stamps_updated_at() {
    let pipeline = synthetic_pipeline();

    let created = pipeline
        .handle(&descriptor(
            "POST",
            "/users",
            Some(json!({"name": "Alice"})),
            "s1",
        ))
        .await;
    let id = created.body["id"].as_str().unwrap().to_string();
    let created_at = created.body["created_at"].as_str().unwrap().to_string();

    let updated = pipeline
        .handle(&descriptor(
            "PATCH",
            &format!("/users/{id}"),
            Some(json!({"role": "admin"})),
            "s1",
        ))
        .await;

    assert_eq!(updated.status_code, 200);
    assert_eq!(updated.body["role"], json!("admin"));
    assert_eq!(updated.body["name"], json!("Alice"));
    let updated_at = updated.body["updated_at"].as_str().unwrap();
    assert!(updated_at > created_at.as_str());
}

#[tokio::test]
async fn delete_is_always_empty_success() {
    let pipeline = synthetic_pipeline();

    for path in ["/users/1", "/deeply/nested/thing", "/"] {
        let resp = pipeline.handle(&descriptor("DELETE", path, None, "s1")).await;
        assert!(resp.status_code == 204 || resp.status_code == 200);
        assert_eq!(resp.body, json!({}));
    }
}
