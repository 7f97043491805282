use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use recsys_api::{
    config::Config,
    db::{create_pool, create_redis_client, PgStore, RedisCache},
    routes::{create_router, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("recsys_api=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = create_pool(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to connect to PostgreSQL")?;
    let store = Arc::new(PgStore::new(pool));

    let redis_client =
        create_redis_client(&config.redis_url).context("Failed to create Redis client")?;
    let (cache, cache_writer) = RedisCache::new(redis_client, config.redis_timeout());

    let state = Arc::new(AppState::new(
        store.clone(),
        store.clone(),
        store,
        Arc::new(cache),
        config.recommendation_top_n,
        config.recommendation_ttl_secs,
    ));

    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(address = %address, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    cache_writer.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM
///
/// The SIGTERM listener is registered when this is called, not when first polled.
fn shutdown_signal() -> impl Future<Output = ()> {
    #[cfg(unix)]
    let sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .map_err(|e| tracing::error!(error = %e, "Failed to listen for SIGTERM"))
        .ok();

    async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async move {
            match sigterm {
                Some(mut sigterm) => {
                    sigterm.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
            _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
        }
    }
}
