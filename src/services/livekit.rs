use std::time::Duration;

use reqwest::Url;
use tokio::net::TcpStream;

use crate::config::{ConfigError, LiveKitConfig};
use crate::services::connectivity::{ConnectivityCheck, CheckFuture};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// LiveKit media server reachability, checked with a raw TCP connect.
#[derive(Clone)]
pub struct LiveKitClient {
    host: String,
    port: u16,
}

impl std::fmt::Debug for LiveKitClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveKitClient")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl LiveKitClient {
    pub fn new(config: &LiveKitConfig) -> Result<Self, ConfigError> {
        // Validated only; the TCP connect does not authenticate.
        if config.api_key.is_none() || config.api_secret.is_none() {
            return Err(ConfigError::Missing("LIVEKIT_API_KEY/LIVEKIT_API_SECRET"));
        }

        let invalid = || ConfigError::Invalid {
            key: "LIVEKIT_API_URL",
            value: config.api_url.clone(),
        };
        let url = Url::parse(&config.api_url).map_err(|_| invalid())?;
        let host = url.host_str().ok_or_else(invalid)?.to_string();
        let port = url.port_or_known_default().ok_or_else(invalid)?;

        Ok(Self { host, port })
    }

    pub fn address(&self) -> (&str, u16) {
        (&self.host, self.port)
    }

    async fn connect_ok(&self) -> bool {
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        match tokio::time::timeout(CONNECT_TIMEOUT, connect).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                tracing::warn!(host = %self.host, port = self.port, error = %e, "livekit connect failed");
                false
            }
            Err(_) => {
                tracing::warn!(host = %self.host, port = self.port, "livekit connect timed out");
                false
            }
        }
    }
}

impl ConnectivityCheck for LiveKitClient {
    fn name(&self) -> &str {
        "livekit"
    }

    fn test_connection(&self) -> CheckFuture<'_> {
        Box::pin(self.connect_ok())
    }
}
