use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::{ConfigError, TavusConfig};
use crate::error::UpstreamError;
use crate::services::connectivity::{ConnectivityCheck, CheckFuture};

const SERVICE: &str = "Tavus";
const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Status and decoded body of a Tavus API response.
#[derive(Debug, Clone)]
pub struct TavusResponse {
    pub status: u16,
    pub body: Value,
}

impl TavusResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Clone)]
pub struct TavusClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl std::fmt::Debug for TavusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavusClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl TavusClient {
    pub fn new(config: &TavusConfig, client: Client) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(ConfigError::Missing("TAVUS_API_KEY"))?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// `POST /v2/conversations`. Non-2xx statuses are returned, not raised;
    /// only transport failures are errors.
    pub async fn create_conversation<T>(&self, payload: &T) -> Result<TavusResponse, UpstreamError>
    where
        T: Serialize + ?Sized,
    {
        let response = self
            .client
            .post(format!("{}/v2/conversations", self.api_url))
            .header("x-api-key", &self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(TavusResponse { status, body })
    }

    async fn list_videos_ok(&self) -> bool {
        let result = self
            .client
            .get(format!("{}/v2/videos", self.api_url))
            .header("x-api-key", &self.api_key)
            .timeout(CHECK_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status();
                tracing::debug!(status = status.as_u16(), "tavus connectivity response");
                status == reqwest::StatusCode::OK
            }
            Err(e) => {
                tracing::warn!(error = %e, "tavus connectivity check failed");
                false
            }
        }
    }
}

impl ConnectivityCheck for TavusClient {
    fn name(&self) -> &str {
        "tavus"
    }

    fn test_connection(&self) -> CheckFuture<'_> {
        Box::pin(self.list_videos_ok())
    }
}
