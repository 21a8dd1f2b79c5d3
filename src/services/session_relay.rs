use std::time::Instant;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{
    DEFAULT_CUSTOM_GREETING, DEFAULT_LANGUAGE, DEFAULT_PARTICIPANT_ABSENT_TIMEOUT,
    DEFAULT_PARTICIPANT_LEFT_TIMEOUT, DEFAULT_PERSONA_ID, DEFAULT_REPLICA_ID, TavusConfig,
    first_present,
};
use crate::error::{AppError, SessionStage, UpstreamError};
use crate::message::{SessionRequest, context_len};
use crate::services::metrics_manager::MetricsManager;
use crate::services::tavus::{TavusClient, TavusResponse};

pub const SPANISH_LANGUAGE: &str = "spanish";

/// Appended to every conversational context sent to Tavus.
pub const SPANISH_INSTRUCTION: &str = "Instrucción obligatoria: hablá únicamente en español \
argentino durante toda la conversación, aunque el usuario hable en otro idioma. Usá un tono \
cálido y cercano, y limitá tus respuestas al mundo de la carne: cortes, maridajes, preparación y origen.";

/// Body of `POST /v2/conversations`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationPayload {
    pub replica_id: String,
    pub persona_id: String,
    pub custom_greeting: String,
    pub conversational_context: String,
    pub properties: Map<String, Value>,
}

impl ConversationPayload {
    /// Resolves every field as request body, then configuration, then built-in default.
    pub fn build(request: &SessionRequest, defaults: &TavusConfig) -> Self {
        let resolve = |body: &Option<String>, config: &Option<String>, fallback: &'static str| {
            first_present([body.as_deref(), config.as_deref()])
                .unwrap_or(fallback)
                .to_string()
        };

        let language = resolve(&request.language, &defaults.language, DEFAULT_LANGUAGE);
        let left_timeout = request
            .participant_left_timeout
            .or(defaults.participant_left_timeout)
            .unwrap_or(DEFAULT_PARTICIPANT_LEFT_TIMEOUT);
        let absent_timeout = request
            .participant_absent_timeout
            .or(defaults.participant_absent_timeout)
            .unwrap_or(DEFAULT_PARTICIPANT_ABSENT_TIMEOUT);

        // Caller keys first; the timeouts and language always win.
        let mut properties = request.properties.clone().unwrap_or_default();
        properties.insert("participant_left_timeout".into(), left_timeout.into());
        properties.insert("participant_absent_timeout".into(), absent_timeout.into());
        properties.insert("language".into(), Value::String(language));

        Self {
            replica_id: resolve(&request.replica_id, &defaults.replica_id, DEFAULT_REPLICA_ID),
            persona_id: resolve(&request.persona_id, &defaults.persona_id, DEFAULT_PERSONA_ID),
            custom_greeting: resolve(
                &request.custom_greeting,
                &defaults.custom_greeting,
                DEFAULT_CUSTOM_GREETING,
            ),
            conversational_context: with_spanish_instruction(
                request.conversational_context.as_ref(),
            ),
            properties,
        }
    }

    pub fn language(&self) -> &str {
        self.properties
            .get("language")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_LANGUAGE)
    }

    pub fn is_spanish(&self) -> bool {
        self.language().eq_ignore_ascii_case(SPANISH_LANGUAGE)
    }

    /// Same payload with `properties.language` forced.
    pub fn with_language(&self, language: &str) -> Self {
        let mut payload = self.clone();
        payload
            .properties
            .insert("language".into(), Value::String(language.to_string()));
        payload
    }
}

fn with_spanish_instruction(context: Option<&Value>) -> String {
    let prior = match context {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    if prior.is_empty() {
        SPANISH_INSTRUCTION.to_string()
    } else {
        format!("{prior}\n\n{SPANISH_INSTRUCTION}")
    }
}

/// Creates Tavus conversations, retrying once in Spanish when a non-Spanish
/// request is rejected.
#[derive(Debug, Clone)]
pub struct SessionRelay {
    client: Option<TavusClient>,
    defaults: TavusConfig,
}

impl SessionRelay {
    pub fn new(client: Option<TavusClient>, defaults: TavusConfig) -> Self {
        Self { client, defaults }
    }

    pub async fn create_session(
        &self,
        request: &SessionRequest,
        metrics: &MetricsManager,
    ) -> Result<TavusResponse, AppError> {
        let client = self
            .client
            .as_ref()
            .ok_or(AppError::NotConfigured("TAVUS_API_KEY"))?;

        let payload = ConversationPayload::build(request, &self.defaults);
        tracing::info!(
            replica_id = %payload.replica_id,
            persona_id = %payload.persona_id,
            language = payload.language(),
            context_chars = request.conversational_context.as_ref().map(context_len).unwrap_or(0),
            "creating tavus conversation"
        );

        let first = attempt(client, &payload, metrics)
            .await
            .map_err(|source| AppError::SessionUnreachable {
                stage: SessionStage::FirstAttempt,
                source,
            })?;
        if first.is_success() {
            return Ok(first);
        }

        if payload.is_spanish() {
            return Err(AppError::SessionFailed {
                stage: SessionStage::FirstAttempt,
                status: first.status,
                body: first.body,
            });
        }

        tracing::warn!(
            status = first.status,
            language = payload.language(),
            "tavus rejected conversation, retrying in spanish"
        );
        let fallback = payload.with_language(SPANISH_LANGUAGE);
        let second = match attempt(client, &fallback, metrics).await {
            Ok(response) => response,
            Err(source) => {
                metrics.record_fallback("error");
                return Err(AppError::SessionUnreachable {
                    stage: SessionStage::Fallback,
                    source,
                });
            }
        };

        if second.is_success() {
            metrics.record_fallback("recovered");
            Ok(second)
        } else {
            metrics.record_fallback("failed");
            Err(AppError::SessionFailed {
                stage: SessionStage::Fallback,
                status: second.status,
                body: second.body,
            })
        }
    }
}

async fn attempt(
    client: &TavusClient,
    payload: &ConversationPayload,
    metrics: &MetricsManager,
) -> Result<TavusResponse, UpstreamError> {
    let started = Instant::now();
    let result = client.create_conversation(payload).await;
    let outcome = match &result {
        Ok(response) if response.is_success() => "success",
        Ok(_) => "rejected",
        Err(UpstreamError::Transport { timed_out: true, .. }) => "timeout",
        Err(_) => "error",
    };
    metrics.record_upstream("tavus", outcome, started.elapsed().as_secs_f64());
    result
}
