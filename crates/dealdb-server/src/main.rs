mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use dealdb_catalog::{CatalogService, CatalogStore, RefreshCoordinator};
use dealdb_scraper::UpstreamClient;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = dealdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let sources = dealdb_core::load_sources(&config.sources_path)?.sources;
    tracing::info!(
        env = %config.env,
        sources = sources.len(),
        ttl_secs = config.catalog_ttl_secs,
        "starting dealdb-server"
    );

    let client = UpstreamClient::from_app_config(&config)?;
    let coordinator = Arc::new(RefreshCoordinator::new(
        client,
        sources,
        Arc::new(CatalogStore::new()),
    ));
    let catalog = CatalogService::new(coordinator, config.catalog_ttl());

    let _scheduler =
        scheduler::build_scheduler(catalog.clone(), config.refresh_cron.as_deref()).await?;

    let app = build_app(AppState { catalog });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
