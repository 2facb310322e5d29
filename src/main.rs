use anyhow::Context;
use csintel::{connect_database, create_app, AppConfig, AppState};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env();
    let db = connect_database(&config.database_url)
        .await
        .context("failed to connect to database")?;
    let state = AppState::new(&config, db).context("failed to build HTTP client")?;

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Server running on http://{}", listener.local_addr()?);

    // The rate limiter keys on the peer address when no forwarding header is present
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
