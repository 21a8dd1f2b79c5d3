// src/message.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct ConversationRequest {
    pub text: String,
    /// Carried for forward compatibility; never parsed or stored.
    #[serde(default)]
    pub conversational_context: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationReply {
    pub reply: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionRequest {
    pub replica_id: Option<String>,
    pub persona_id: Option<String>,
    pub custom_greeting: Option<String>,
    pub language: Option<String>,
    pub participant_left_timeout: Option<u64>,
    pub participant_absent_timeout: Option<u64>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    #[serde(default)]
    pub conversational_context: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// Size of an opaque context value, for logging without echoing its contents.
pub fn context_len(context: &Value) -> usize {
    match context {
        Value::String(s) => s.chars().count(),
        Value::Null => 0,
        other => other.to_string().len(),
    }
}
