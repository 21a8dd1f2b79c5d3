#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use serde_json::Value;
use sommelier_relay::config::AppConfig;
use sommelier_relay::routes::create_router;
use sommelier_relay::state::AppState;
use tokio::net::TcpSocket;

pub fn config(pairs: &[(&str, &str)]) -> AppConfig {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    AppConfig::from_lookup(move |key| map.get(key).cloned()).unwrap()
}

pub fn app(pairs: &[(&str, &str)]) -> Router {
    let state = Arc::new(AppState::new(&config(pairs)).unwrap());
    create_router(state)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// A loopback port held bound without `listen()`, so connections are refused
/// for as long as the value lives.
pub struct ClosedPort {
    _socket: TcpSocket,
    port: u16,
}

impl ClosedPort {
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }
}

pub fn closed_port() -> ClosedPort {
    let socket = TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let port = socket.local_addr().unwrap().port();
    ClosedPort {
        _socket: socket,
        port,
    }
}

/// A reqwest client that gives up after `millis`.
pub fn short_timeout_client(millis: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(millis))
        .build()
        .unwrap()
}
