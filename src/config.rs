// src/config.rs
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TAVUS_API_URL: &str = "https://tavusapi.com";
pub const DEFAULT_LIVEKIT_API_URL: &str = "http://localhost:7880";

pub const DEFAULT_REPLICA_ID: &str = "r79e1c033f";
pub const DEFAULT_PERSONA_ID: &str = "p5317866";
pub const DEFAULT_LANGUAGE: &str = "spanish";
pub const DEFAULT_CUSTOM_GREETING: &str =
    "¡Hola! Soy tu sommelier virtual de carnes. ¿Qué corte te gustaría conocer hoy?";
pub const DEFAULT_PARTICIPANT_LEFT_TIMEOUT: u64 = 120;
pub const DEFAULT_PARTICIPANT_ABSENT_TIMEOUT: u64 = 300;

const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 15;

/// Origins allowed to call the API from a browser.
pub const ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
    "http://frontend:3000",
    "https://tusommeliervirtual.com",
    "http://tusommeliervirtual.com",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Returns the first source holding a non-blank value.
///
/// Every "request body, then configuration, then built-in default" chain in the
/// relays resolves through this helper.
pub fn first_present<'a, I>(sources: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    sources
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}

#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Clone, Debug)]
pub struct TavusConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub replica_id: Option<String>,
    pub persona_id: Option<String>,
    pub custom_greeting: Option<String>,
    pub language: Option<String>,
    pub participant_left_timeout: Option<u64>,
    pub participant_absent_timeout: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct LiveKitConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

/// Process configuration, read once at startup and shared read-only afterwards.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub openai: OpenAiConfig,
    pub tavus: TavusConfig,
    pub livekit: LiveKitConfig,
    pub sentry_dsn: Option<String>,
    pub upstream_timeout: Duration,
}

impl AppConfig {
    /// Loads `config/secrets.env` and `.env` (when present) and reads the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::from_path("config/secrets.env").ok();
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_number::<u16>("PORT", get("PORT"))?.unwrap_or(8000);
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|_| ConfigError::Invalid {
                    key: "HOST",
                    value: host.clone(),
                })?;

        let upstream_timeout_secs =
            parse_number::<u64>("UPSTREAM_TIMEOUT_SECS", get("UPSTREAM_TIMEOUT_SECS"))?
                .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS);

        Ok(Self {
            bind_addr,
            openai: OpenAiConfig {
                api_key: get("OPENAI_API_KEY"),
                model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                base_url: get("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            },
            tavus: TavusConfig {
                api_key: get("TAVUS_API_KEY"),
                api_url: get("TAVUS_API_URL").unwrap_or_else(|| DEFAULT_TAVUS_API_URL.to_string()),
                replica_id: get("TAVUS_REPLICA_ID"),
                persona_id: get("TAVUS_PERSONA_ID"),
                custom_greeting: get("TAVUS_CUSTOM_GREETING"),
                language: get("TAVUS_LANGUAGE"),
                participant_left_timeout: parse_number(
                    "TAVUS_PARTICIPANT_LEFT_TIMEOUT",
                    get("TAVUS_PARTICIPANT_LEFT_TIMEOUT"),
                )?,
                participant_absent_timeout: parse_number(
                    "TAVUS_PARTICIPANT_ABSENT_TIMEOUT",
                    get("TAVUS_PARTICIPANT_ABSENT_TIMEOUT"),
                )?,
            },
            livekit: LiveKitConfig {
                api_url: get("LIVEKIT_API_URL")
                    .unwrap_or_else(|| DEFAULT_LIVEKIT_API_URL.to_string()),
                api_key: get("LIVEKIT_API_KEY"),
                api_secret: get("LIVEKIT_API_SECRET"),
            },
            sentry_dsn: get("SENTRY_DSN"),
            upstream_timeout: Duration::from_secs(upstream_timeout_secs),
        })
    }
}

fn parse_number<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
) -> Result<Option<T>, ConfigError> {
    raw.map(|value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn first_present_skips_missing_and_blank() {
        assert_eq!(first_present([None, Some("  "), Some("b"), Some("c")]), Some("b"));
        assert_eq!(first_present([Some("a"), Some("b")]), Some("a"));
        assert_eq!(first_present([None, Some("")]), None);
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.bind_addr.port(), 8000);
        assert_eq!(cfg.openai.model, DEFAULT_OPENAI_MODEL);
        assert!(cfg.openai.api_key.is_none());
        assert_eq!(cfg.tavus.api_url, DEFAULT_TAVUS_API_URL);
        assert!(cfg.tavus.participant_left_timeout.is_none());
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(15));
    }

    #[test]
    fn reads_values_and_treats_blank_as_absent() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("OPENAI_API_KEY", "sk-test"),
            ("TAVUS_API_KEY", "   "),
            ("TAVUS_LANGUAGE", "french"),
            ("TAVUS_PARTICIPANT_ABSENT_TIMEOUT", "45"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.openai.api_key.as_deref(), Some("sk-test"));
        assert!(cfg.tavus.api_key.is_none());
        assert_eq!(cfg.tavus.language.as_deref(), Some("french"));
        assert_eq!(cfg.tavus.participant_absent_timeout, Some(45));
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let err = AppConfig::from_lookup(lookup(&[("TAVUS_PARTICIPANT_LEFT_TIMEOUT", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { key: "TAVUS_PARTICIPANT_LEFT_TIMEOUT", .. }
        ));
    }
}
