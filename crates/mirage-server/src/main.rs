use anyhow::Context;
use clap::Parser;
use mirage_server::cache::ResponseCache;
use mirage_server::config::Settings;
use mirage_server::context::SessionContextStore;
use mirage_server::gateway::ProviderGateway;
use mirage_server::pipeline::MockPipeline;
use mirage_server::server::{AppState, MirageServer};
use mirage_server::store::create_store;
use mirage_server::traffic::TrafficLog;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mirage_server=info,info")),
        )
        .init();

    let settings = Settings::parse();

    let store = create_store(settings.store, &settings.redis_url)
        .context("Failed to initialize storage backend")?;

    // Each service is constructed once here and passed explicitly; no globals
    let state = Arc::new(AppState {
        pipeline: MockPipeline::new(
            ResponseCache::new(store.clone(), settings.cache_ttl_secs),
            SessionContextStore::new(store.clone(), settings.context_ttl_secs),
            ProviderGateway::from_settings(&settings),
        ),
        traffic: Arc::new(TrafficLog::new(store)),
    });

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .context("Invalid host/port")?;

    let server = MirageServer::new(addr, state);

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}
