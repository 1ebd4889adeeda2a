use parts_admin_api::{app::app_with_layers, config, state::AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up PROJECT_ID, credentials, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    tracing::info!("Starting Parts Admin API in {:?} mode", config.environment);
    if parts_admin_api::is_production!() && config.security.access_token.is_some() {
        tracing::warn!("Static access token configured in production; prefer service account credentials");
    }

    let state = AppState::global().map_err(|e| anyhow::anyhow!("failed to initialize service clients: {}", e))?;
    let app = app_with_layers(state.clone(), config);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Parts Admin API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
