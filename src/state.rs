// src/state.rs
use std::sync::Arc;

use reqwest::Client;

use crate::config::{AppConfig, ConfigError};
use crate::services::chat_relay::ChatRelay;
use crate::services::metrics_manager::MetricsManager;
use crate::services::session_relay::SessionRelay;
use crate::services::tavus::TavusClient;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    /// `None` when the completion credential is absent.
    pub chat: Option<ChatRelay>,
    pub session: SessionRelay,
    pub metrics: MetricsManager,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        let chat = match ChatRelay::new(&config.openai, client.clone()) {
            Ok(relay) => Some(relay),
            Err(e) => {
                tracing::warn!(error = %e, "chat relay disabled");
                None
            }
        };

        let tavus = match TavusClient::new(&config.tavus, client) {
            Ok(tavus) => Some(tavus),
            Err(e) => {
                tracing::warn!(error = %e, "session relay disabled");
                None
            }
        };

        let metrics = MetricsManager::new()?;

        Ok(Self {
            chat,
            session: SessionRelay::new(tavus, config.tavus.clone()),
            metrics,
        })
    }
}
