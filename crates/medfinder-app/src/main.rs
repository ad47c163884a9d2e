use std::sync::Arc;

use medfinder_app::app::api::routes;
use medfinder_app::config::ConfigHandler;
use medfinder_app::store_handler::StoreHandler;
use medfinder_core::config::{DatabaseBackend, load_config};
use medfinder_db::db::connection::create_pool;
use medfinder_db::db::migrate::run_migrations;
use medfinder_db::db::spatial_index;
use medfinder_db::store::{MemoryPharmacyStore, PgPharmacyStore, PharmacyStore};
use salvo::conn::TcpListener;
use salvo::logging::Logger;
use salvo::{Listener, Router};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

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

    tracing::info!("Starting medfinder pharmacy search server");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let store: Arc<dyn PharmacyStore> = match config.database.backend {
        DatabaseBackend::Postgres => {
            if config.database.run_migrations {
                run_migrations(&config.database.url).await?;
                tracing::info!("Database migrations applied");
            }

            let pool = create_pool(
                &config.database.url,
                u32::from(config.database.max_connections),
            )
            .await?;

            tracing::info!("Database connection pool created.");
            Arc::new(PgPharmacyStore::new(Arc::new(pool)))
        }
        DatabaseBackend::Memory => {
            tracing::warn!("Using the in-memory store; records are lost on shutdown");
            Arc::new(MemoryPharmacyStore::new())
        }
    };

    let index_state = spatial_index::initialize(store.as_ref()).await;
    tracing::info!(?index_state, "Spatial index initialization finished");

    let bind_addr = config.server.bind_addr();
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new()
        .hoop(Logger::new())
        .hoop(StoreHandler { store })
        .hoop(ConfigHandler {
            settings: config.clone(),
        })
        .push(routes());

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(router).await;

    Ok(())
}
