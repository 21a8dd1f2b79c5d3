use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{
    error::AppError,
    message::{ConversationReply, ConversationRequest},
    state::SharedState,
};

pub async fn conversation_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ConversationRequest>, JsonRejection>,
) -> Result<Json<ConversationReply>, AppError> {
    let Json(payload) = payload?;
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("text cannot be empty".to_string()));
    }

    let relay = state
        .chat
        .as_ref()
        .ok_or(AppError::NotConfigured("OPENAI_API_KEY"))?;

    let reply = relay
        .generate_reply(text, payload.conversational_context.as_ref(), &state.metrics)
        .await?;

    Ok(Json(ConversationReply { reply }))
}
