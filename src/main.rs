use std::sync::Arc;

use sommelier_relay::{config::AppConfig, routes, state::AppState};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        openai_key = config.openai.api_key.is_some(),
        tavus_key = config.tavus.api_key.is_some(),
        model = %config.openai.model,
        error_tracking = config.sentry_dsn.is_some(),
        "configuration loaded"
    );

    let addr = config.bind_addr;
    let state = Arc::new(AppState::new(&config)?);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("sommelier relay listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
