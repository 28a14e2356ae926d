use std::sync::Arc;

use agenda_api::{app, AppState};
use agenda_core::BookingService;
use agenda_store::{app_config::Config, RecordStore};
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load config")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = RecordStore::open(&config.storage.data_file)
        .await
        .context("Failed to open reservation store")?;
    tracing::info!("Reservations stored in {}", store.path().display());

    let app_state = AppState {
        bookings: BookingService::new(Arc::new(store)),
    };

    if let Some(dir) = &config.web.static_dir {
        tracing::info!("Serving static files from {}", dir.display());
    }
    let app = app(app_state, config.web.static_dir.as_deref());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
