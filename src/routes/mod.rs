// src/routes/mod.rs
pub mod conversation;
pub mod session;
pub mod status;

use std::time::Instant;

use crate::config::ALLOWED_ORIGINS;
use crate::state::SharedState;
use axum::{
    Router,
    extract::{MatchedPath, Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use conversation::conversation_handler;
use session::create_conversation_handler;
use status::{health_handler, metrics_handler};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub const SESSION_PATH: &str = "/create-conversation";

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/conversation", post(conversation_handler))
        .route(SESSION_PATH, post(create_conversation_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

/// Listed origins only. Credentials are allowed, so methods and headers are
/// mirrored from the preflight instead of using a wildcard.
pub fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = ALLOWED_ORIGINS
        .iter()
        .copied()
        .map(HeaderValue::from_static)
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

async fn track_metrics(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());
    let method = req.method().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    state.metrics.record_http(
        &method,
        &route,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}
