use std::sync::Arc;

use anyhow::Context;
use salvo::conn::TcpListener;
use salvo::{Listener, Router};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};
use warden_app::app::api::routes;
use warden_app::engine_handler::EngineHandler;
use warden_core::config::{Settings, StorageBackend, load_config};
use warden_db::db::connection::create_pool;
use warden_db::db::migrate::run_migrations;
use warden_service::authz::{AuthorizationService, MemoryStore, PgStore, Stores, seed_actors};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Warden authorization engine");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let stores = build_stores(&config).await?;
    let engine = AuthorizationService::from_config(&config.authz, stores).await?;

    let bind_addr = config.server.bind_addr();
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new()
        .hoop(EngineHandler {
            engine: Arc::new(engine),
        })
        .push(routes()?);

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(router).await;

    Ok(())
}

async fn build_stores(config: &Settings) -> anyhow::Result<Stores> {
    match config.storage.backend {
        StorageBackend::Memory => {
            let store = Arc::new(MemoryStore::new());
            let seeded = seed_actors(store.as_ref(), &config.storage.seed_actors).await?;
            tracing::info!(seeded_actors = seeded, "Using in-memory storage");
            Ok(Stores::from_backend(store))
        }
        StorageBackend::Postgres => {
            let url = config
                .database
                .url
                .as_deref()
                .context("database.url is required for the postgres backend")?;
            run_migrations(url).await?;
            let pool = create_pool(url, u32::from(config.database.max_connections)).await?;
            tracing::info!("Database connection pool created.");
            let store = Arc::new(PgStore::new(pool));
            let seeded = seed_actors(store.as_ref(), &config.storage.seed_actors).await?;
            tracing::info!(seeded_actors = seeded, "Using PostgreSQL storage");
            Ok(Stores::from_backend(store))
        }
    }
}
