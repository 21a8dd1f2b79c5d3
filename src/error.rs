// src/error.rs
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

/// Failure talking to a third-party service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
        timed_out: bool,
    },

    #[error("{service} returned status {status}: {message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("{service} returned an empty response")]
    EmptyResponse { service: &'static str },

    #[error("{service} returned an unreadable response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

impl UpstreamError {
    pub fn transport(service: &'static str, err: reqwest::Error) -> Self {
        Self::Transport {
            service,
            timed_out: err.is_timeout(),
            message: err.to_string(),
        }
    }
}

/// Which attempt of session creation produced the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStage {
    FirstAttempt,
    Fallback,
}

impl SessionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStage::FirstAttempt => "first_attempt",
            SessionStage::Fallback => "fallback",
        }
    }
}

/// Errors surfaced to HTTP callers as `{ "detail": ... }`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("invalid request body: {}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("conversation creation failed at {}", .stage.as_str())]
    SessionFailed {
        stage: SessionStage,
        status: u16,
        body: Value,
    },

    #[error("conversation creation failed at {}: {source}", .stage.as_str())]
    SessionUnreachable {
        stage: SessionStage,
        source: UpstreamError,
    },
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidBody(rejection) => rejection.status(),
            AppError::NotConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upstream(_) | AppError::SessionUnreachable { .. } => StatusCode::BAD_GATEWAY,
            // Only upstream 5xx passes through; any other non-2xx becomes 502.
            AppError::SessionFailed { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(StatusCode::is_server_error)
                .unwrap_or(StatusCode::BAD_GATEWAY),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match &self {
            AppError::SessionFailed {
                stage,
                status: upstream_status,
                body,
            } => {
                json!({
                    "message": session_failure_message(*stage),
                    "stage": stage.as_str(),
                    "upstream_status": upstream_status,
                    "upstream_body": body,
                })
            }
            AppError::SessionUnreachable { stage, source } => json!({
                "message": session_failure_message(*stage),
                "stage": stage.as_str(),
                "error": source.to_string(),
            }),
            AppError::InvalidBody(rejection) => Value::String(rejection.body_text()),
            other => Value::String(other.to_string()),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

fn session_failure_message(stage: SessionStage) -> &'static str {
    match stage {
        SessionStage::FirstAttempt => "Error creating Tavus conversation",
        SessionStage::Fallback => "Error creating Tavus conversation after language fallback",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_failure_passes_only_server_errors_through() {
        let err = AppError::SessionFailed {
            stage: SessionStage::FirstAttempt,
            status: 503,
            body: Value::Null,
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let err = AppError::SessionFailed {
            stage: SessionStage::FirstAttempt,
            status: 401,
            body: Value::Null,
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

        let err = AppError::SessionFailed {
            stage: SessionStage::Fallback,
            status: 200,
            body: Value::Null,
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn unreachable_session_keeps_its_stage() {
        let err = AppError::SessionUnreachable {
            stage: SessionStage::Fallback,
            source: UpstreamError::Transport {
                service: "Tavus",
                message: "operation timed out".into(),
                timed_out: true,
            },
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("fallback"));
    }

    #[test]
    fn empty_response_is_distinct_from_transport_failure() {
        let empty = AppError::from(UpstreamError::EmptyResponse { service: "OpenAI" });
        let status = AppError::from(UpstreamError::Status {
            service: "OpenAI",
            status: 500,
            message: "boom".into(),
        });
        assert_eq!(empty.status_code(), StatusCode::BAD_GATEWAY);
        assert!(empty.to_string().contains("empty response"));
        assert!(!status.to_string().contains("empty response"));
    }
}
