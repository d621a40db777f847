use std::sync::Arc;

use climatefit_api::{
    config::{Config, StorageBackend},
    db::{self, CacheWriterHandle},
    routes::{create_router, AppState},
    services::{
        stores::{
            ArchiveSource, CatalogSource, HttpArchiveSource, MemoryCatalogSource,
            MemoryProfileStore, PgCatalogSource, PgProfileStore, ProfileStore,
            StaticArchiveSource,
        },
        CatalogReader, ClimateArchive,
    },
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "climatefit_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(backend = ?config.storage_backend, "Starting climatefit-api");

    let (catalog_source, profile_store) = build_stores(&config).await?;
    let (archive_source, cache_writer) = build_archive_source(&config)?;

    let catalog = CatalogReader::new(catalog_source, config.store_timeout());
    let archive = ClimateArchive::new(archive_source, config.archive_timeout());

    let bind_address = config.bind_address();
    let state = Arc::new(AppState::new(config, catalog, profile_store, archive));
    let app = create_router(state)?;

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server running on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(cache_writer) = cache_writer {
        cache_writer.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn build_stores(
    config: &Config,
) -> anyhow::Result<(Arc<dyn CatalogSource>, Arc<dyn ProfileStore>)> {
    match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = db::create_pool(
                &config.database_url,
                config.db_max_connections,
                config.store_timeout(),
            )
            .await?;
            db::run_migrations(&pool).await?;

            Ok((
                Arc::new(PgCatalogSource::new(pool.clone())),
                Arc::new(PgProfileStore::new(pool)),
            ))
        }
        StorageBackend::Memory => {
            let catalog = match &config.catalog_seed_path {
                Some(path) => MemoryCatalogSource::from_seed_file(path).await?,
                None => {
                    tracing::warn!("No CATALOG_SEED_PATH set, the city catalog is empty");
                    MemoryCatalogSource::default()
                }
            };

            Ok((Arc::new(catalog), Arc::new(MemoryProfileStore::new())))
        }
    }
}

fn build_archive_source(
    config: &Config,
) -> anyhow::Result<(Arc<dyn ArchiveSource>, Option<CacheWriterHandle>)> {
    let Some(url) = &config.climate_archive_url else {
        tracing::warn!("No CLIMATE_ARCHIVE_URL set, climate map endpoints will be empty");
        return Ok((Arc::new(StaticArchiveSource::default()), None));
    };

    let redis_client = db::create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = db::Cache::new(redis_client);

    let source = HttpArchiveSource::new(url.clone(), config.archive_timeout())?
        .with_cache(cache, config.archive_cache_ttl_secs);

    Ok((Arc::new(source), Some(cache_writer)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
