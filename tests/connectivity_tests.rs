mod common;

use reqwest::Client;
use sommelier_relay::config::ConfigError;
use sommelier_relay::services::livekit::LiveKitClient;
use sommelier_relay::services::pipeline::Pipeline;
use sommelier_relay::services::connectivity::ConnectivityCheck;
use sommelier_relay::services::tavus::TavusClient;
use tokio::net::TcpListener;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn livekit_reports_open_and_closed_ports() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let open = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
    let config = common::config(&[
        ("LIVEKIT_API_URL", open.as_str()),
        ("LIVEKIT_API_KEY", "k"),
        ("LIVEKIT_API_SECRET", "s"),
    ]);

    let client = LiveKitClient::new(&config.livekit).unwrap();
    assert!(client.test_connection().await);

    let closed = common::closed_port();
    let closed_url = closed.url();
    let config = common::config(&[
        ("LIVEKIT_API_URL", closed_url.as_str()),
        ("LIVEKIT_API_KEY", "k"),
        ("LIVEKIT_API_SECRET", "s"),
    ]);
    let client = LiveKitClient::new(&config.livekit).unwrap();
    assert!(!client.test_connection().await);
}

#[test]
fn livekit_requires_credentials() {
    let config = common::config(&[("LIVEKIT_API_KEY", "k")]);
    let err = LiveKitClient::new(&config.livekit).unwrap_err();
    assert!(matches!(err, ConfigError::Missing(_)));

    let config = common::config(&[("LIVEKIT_API_SECRET", "s")]);
    let err = LiveKitClient::new(&config.livekit).unwrap_err();
    assert!(matches!(err, ConfigError::Missing(_)));
}

#[test]
fn livekit_defaults_to_local_server() {
    let config = common::config(&[("LIVEKIT_API_KEY", "k"), ("LIVEKIT_API_SECRET", "s")]);
    let client = LiveKitClient::new(&config.livekit).unwrap();
    assert_eq!(client.address(), ("localhost", 7880));
}

#[tokio::test]
async fn tavus_check_is_true_only_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/videos"))
        .and(header("x-api-key", "good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/videos"))
        .and(header("x-api-key", "bad"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let good = common::config(&[("TAVUS_API_KEY", "good"), ("TAVUS_API_URL", server.uri().as_str())]);
    let client = TavusClient::new(&good.tavus, Client::new()).unwrap();
    assert!(client.test_connection().await);

    let bad = common::config(&[("TAVUS_API_KEY", "bad"), ("TAVUS_API_URL", server.uri().as_str())]);
    let client = TavusClient::new(&bad.tavus, Client::new()).unwrap();
    assert!(!client.test_connection().await);
}

#[tokio::test]
async fn tavus_check_swallows_transport_errors() {
    let closed = common::closed_port();
    let base = closed.url();
    let config = common::config(&[("TAVUS_API_KEY", "key"), ("TAVUS_API_URL", base.as_str())]);
    let client = TavusClient::new(&config.tavus, Client::new()).unwrap();
    assert!(!client.test_connection().await);
}

#[test]
fn tavus_requires_credentials() {
    let config = common::config(&[]);
    let err = TavusClient::new(&config.tavus, Client::new()).unwrap_err();
    assert!(matches!(err, ConfigError::Missing("TAVUS_API_KEY")));
}

#[test]
fn pipeline_fails_fast_without_credentials() {
    let config = common::config(&[("TAVUS_API_KEY", "key")]);
    assert!(Pipeline::from_config(&config, Client::new()).is_err());
}

#[tokio::test]
async fn pipeline_reports_each_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/videos"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let closed = common::closed_port();
    let livekit = closed.url();
    let config = common::config(&[
        ("TAVUS_API_KEY", "key"),
        ("TAVUS_API_URL", server.uri().as_str()),
        ("LIVEKIT_API_URL", livekit.as_str()),
        ("LIVEKIT_API_KEY", "k"),
        ("LIVEKIT_API_SECRET", "s"),
    ]);

    let report = Pipeline::from_config(&config, Client::new()).unwrap().run().await;
    assert!(report.tavus);
    assert!(!report.livekit);
    assert!(!report.all_ok());
}
