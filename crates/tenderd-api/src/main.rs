use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use tenderd_api::routes::build_router;
use tenderd_api::state::AppState;
use tenderd_core::Config;
use tenderd_db::{ParticipantRepository, TenderRepository};
use tenderd_source::{HttpTenderSource, TenderSource};
use tenderd_storage::{LocalStorage, Storage};
use tenderd_sync::ReconcileService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(&config.upload_dir).await?);
    let source: Arc<dyn TenderSource> = Arc::new(HttpTenderSource::new(
        config.source_base_url.clone(),
        Duration::from_secs(config.source_timeout_secs),
    )?);

    let reconciler = Arc::new(ReconcileService::new(
        TenderRepository::new(pool.clone()),
        ParticipantRepository::new(pool.clone()),
        source.clone(),
        Duration::from_secs(config.reconcile_interval_secs),
        Duration::from_millis(config.reconcile_pause_ms),
    ));
    let _reconcile_handle = reconciler.start();

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let state = Arc::new(AppState::new(config, pool, storage, source));
    let app = build_router(state);

    tracing::info!(%addr, "tenderd listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
