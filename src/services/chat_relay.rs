use std::time::Instant;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{ConfigError, OpenAiConfig};
use crate::error::UpstreamError;
use crate::message::context_len;
use crate::services::metrics_manager::MetricsManager;

const SERVICE: &str = "OpenAI";

/// Fixed persona instruction. Never derived from caller input.
pub const PERSONA_PROMPT: &str = "Sos un sommelier de carnes argentino, egresado de la Facultad de \
Ciencias Veterinarias de la Universidad de Buenos Aires. Respondé siempre en español argentino, \
con calidez, cercanía y profesionalismo. Tu conocimiento se centra en cortes de carne, maridajes, \
preparación y origen. Podés mencionar de manera natural a Espacio Sommelier como referente del \
mundo de la carne, pero sin sonar a autobombo. Nunca respondas sobre temas ajenos a la carne.";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Sends one user turn to the chat completion API under the sommelier persona.
#[derive(Debug, Clone)]
pub struct ChatRelay {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl ChatRelay {
    pub fn new(config: &OpenAiConfig, client: Client) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;
        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single attempt; no retries at this layer.
    pub async fn generate_reply(
        &self,
        text: &str,
        conversational_context: Option<&Value>,
        metrics: &MetricsManager,
    ) -> Result<String, UpstreamError> {
        // Context is accepted but not yet fed into the prompt.
        if let Some(context) = conversational_context {
            tracing::info!(
                context_chars = context_len(context),
                "resuming conversation with prior context"
            );
        }

        let started = Instant::now();
        let result = self.complete(text).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(UpstreamError::EmptyResponse { .. }) => "empty",
            Err(UpstreamError::Transport { timed_out: true, .. }) => "timeout",
            Err(_) => "error",
        };
        metrics.record_upstream("openai", outcome, started.elapsed().as_secs_f64());
        result
    }

    async fn complete(&self, text: &str) -> Result<String, UpstreamError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: PERSONA_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| format!("request failed with status {status}"));
            return Err(UpstreamError::Status {
                service: SERVICE,
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            UpstreamError::Decode {
                service: SERVICE,
                message: e.to_string(),
            }
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(UpstreamError::EmptyResponse { service: SERVICE })
    }
}
