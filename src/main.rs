use campaignhub::{config::Config, create_app, AppState};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load .env (if present) before reading configuration
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    if config.pinata_jwt.is_none() {
        tracing::warn!("PINATA_JWT not set; metadata uploads and lookups by campaign id will fail");
    }
    let bind_addr = config.bind_addr;

    let state = AppState::from_config(config)?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server running on http://{}", bind_addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
