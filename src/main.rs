use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use embedsmith::app::AppState;
use embedsmith::config::AppConfig;
use embedsmith::webhook;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr;
    let state = Arc::new(AppState::from_config(config));

    let router = webhook::router(state);
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("listening for hub notifications on http://{bind_addr}/webhook");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
