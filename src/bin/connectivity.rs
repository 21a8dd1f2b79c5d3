//! Checks that LiveKit and Tavus are reachable with the configured credentials.

use reqwest::Client;
use sommelier_relay::{config::AppConfig, services::pipeline::Pipeline};
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
    let pipeline = Pipeline::from_config(&config, Client::new())?;
    let report = pipeline.run().await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.all_ok() {
        std::process::exit(1);
    }
    Ok(())
}
