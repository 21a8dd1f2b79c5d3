use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::Value;

use crate::{error::AppError, message::SessionRequest, state::SharedState};

/// Proxies conversation creation to Tavus and passes its JSON through verbatim.
pub async fn create_conversation_handler(
    State(state): State<SharedState>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(payload) = payload?;
    let created = state.session.create_session(&payload, &state.metrics).await?;
    let status = StatusCode::from_u16(created.status).unwrap_or(StatusCode::OK);
    Ok((status, Json(created.body)))
}
