//! Request orchestration: cache, context, gateway.
//!
//! One instance is constructed at process start and shared across request
//! tasks; there is no global mutable state. Every failure path yields a
//! well-formed response.

use crate::cache::{fingerprint, ResponseCache};
use crate::context::{SessionContextStore, DEFAULT_READ_WINDOW};
use crate::gateway::ProviderGateway;
use crate::types::{ContextEntry, MockResponse, ProviderStatus, RequestDescriptor};
use tracing::debug;

pub struct MockPipeline {
    cache: ResponseCache,
    context: SessionContextStore,
    gateway: ProviderGateway,
}

impl MockPipeline {
    pub fn new(
        cache: ResponseCache,
        context: SessionContextStore,
        gateway: ProviderGateway,
    ) -> Self {
        Self {
            cache,
            context,
            gateway,
        }
    }

    /// Turn a request into a mock response.
    ///
    /// Cache hit: return the memoized response untouched. Miss: fetch the
    /// session window, generate, memoize, append to the session history.
    pub async fn handle(&self, descriptor: &RequestDescriptor) -> MockResponse {
        let key = fingerprint(
            &descriptor.session_id,
            &descriptor.method,
            &descriptor.path,
            descriptor.body.as_ref(),
        );

        if let Some(cached) = self.cache.get(&key) {
            debug!("Cache hit for {} {}", descriptor.method, descriptor.path);
            return cached;
        }

        let context = self
            .context
            .recent(&descriptor.session_id, DEFAULT_READ_WINDOW);

        let response = match self.gateway.generate(descriptor, &context).await {
            Ok(response) => response,
            // Only reachable with fallback disabled; still a well-formed payload
            Err(e) => MockResponse::internal_error(&e.to_string()),
        };

        self.cache.set(&key, &response);
        self.context.append(
            &descriptor.session_id,
            ContextEntry::from_exchange(descriptor, &response),
        );

        response
    }

    /// Snapshot of the active generation backend.
    pub async fn provider_status(&self) -> ProviderStatus {
        self.gateway.status().await
    }
}
