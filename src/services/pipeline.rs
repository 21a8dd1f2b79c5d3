use reqwest::Client;
use serde::Serialize;

use crate::config::{AppConfig, ConfigError};
use crate::services::livekit::LiveKitClient;
use crate::services::connectivity::ConnectivityCheck;
use crate::services::tavus::TavusClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectivityReport {
    pub livekit: bool,
    pub tavus: bool,
}

impl ConnectivityReport {
    pub fn all_ok(&self) -> bool {
        self.livekit && self.tavus
    }
}

/// Checks that both real-time media services are reachable.
pub struct Pipeline {
    livekit: LiveKitClient,
    tavus: TavusClient,
}

impl Pipeline {
    /// Fails before any network call when either service lacks credentials.
    pub fn from_config(config: &AppConfig, client: Client) -> Result<Self, ConfigError> {
        Ok(Self {
            livekit: LiveKitClient::new(&config.livekit)?,
            tavus: TavusClient::new(&config.tavus, client)?,
        })
    }

    pub async fn run(&self) -> ConnectivityReport {
        tracing::info!("starting connectivity pipeline");
        let report = ConnectivityReport {
            livekit: check(&self.livekit).await,
            tavus: check(&self.tavus).await,
        };
        tracing::info!(livekit = report.livekit, tavus = report.tavus, "connectivity pipeline finished");
        report
    }
}

async fn check(service: &dyn ConnectivityCheck) -> bool {
    let ok = service.test_connection().await;
    if ok {
        tracing::info!(service = service.name(), "service responded");
    } else {
        tracing::warn!(service = service.name(), "service did not respond");
    }
    ok
}
