//! End-to-end connectivity checks against local backends.

use std::sync::atomic::Ordering;
use std::time::Duration;

use connectivity_check::config::ProbeConfig;
use connectivity_check::health::{
    probe_stream, Endpoints, HealthCheckRunner, RequestProbe, WebSocketDialer,
};

mod common;

fn short_window_runner(config: &ProbeConfig, window: Duration) -> HealthCheckRunner {
    let request = RequestProbe::from_config(config).unwrap();
    HealthCheckRunner::with_dialer(request, WebSocketDialer, window)
}

#[tokio::test]
async fn test_both_probes_succeed() {
    let (addr, stats) = common::start_radio_backend("*").await;
    let runner = HealthCheckRunner::from_config(&ProbeConfig::default()).unwrap();

    let result = runner
        .run(Endpoints {
            request_url: format!("http://{}/api/stream/cors-test", addr),
            stream_url: format!("ws://{}/ws/live", addr),
        })
        .settled()
        .await;

    assert!(!result.is_running);
    assert!(result.all_passed());

    let request = result.request_probe.unwrap();
    assert!(request.succeeded());
    assert_eq!(request.payload().unwrap()["status"], "ok");
    assert!(result.stream_probe.unwrap().succeeded());

    // The handshake probe must not leave its connection open.
    assert!(
        common::eventually(Duration::from_secs(2), || stats.ws_closed.load(Ordering::SeqCst) == 1).await,
        "server never saw the probe connection close"
    );
    assert_eq!(stats.ws_opened.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_503_and_stream_timeout() {
    let api = common::start_programmable_backend(|| async { (503, "Service Unavailable".into()) }).await;
    let silent = common::start_silent_backend().await;
    let runner = short_window_runner(&ProbeConfig::default(), Duration::from_millis(300));

    let result = runner
        .run(Endpoints {
            request_url: format!("http://{}/api/stream/cors-test", api),
            stream_url: format!("ws://{}/ws/live", silent),
        })
        .settled()
        .await;

    assert!(!result.is_running);
    let request = result.request_probe.unwrap();
    let stream = result.stream_probe.unwrap();
    assert!(!request.succeeded());
    assert!(!stream.succeeded());
    assert_eq!(request.detail(), Some("HTTP 503: Service Unavailable"));
    assert_eq!(stream.detail(), Some("WebSocket connection timeout"));
}

#[tokio::test]
async fn test_nonstandard_status_uses_canonical_reason() {
    let api = common::start_programmable_backend(|| async { (599, "{}".into()) }).await;
    let probe = RequestProbe::from_config(&ProbeConfig::default()).unwrap();

    let outcome = probe.check(&format!("http://{}/api/stream/cors-test", api)).await;

    assert!(!outcome.succeeded());
    assert_eq!(outcome.detail(), Some("HTTP 599: Unknown"));
}

#[tokio::test]
async fn test_malformed_body() {
    let api = common::start_programmable_backend(|| async { (200, "<html>not json</html>".into()) }).await;
    let probe = RequestProbe::from_config(&ProbeConfig::default()).unwrap();

    let outcome = probe.check(&format!("http://{}/api/stream/cors-test", api)).await;

    assert!(!outcome.succeeded());
    assert!(outcome.detail().unwrap().starts_with("Malformed response body"));
    assert!(outcome.payload().is_none());
}

#[tokio::test]
async fn test_unreachable_backend_never_errors() {
    let addr = common::closed_port();
    let runner = HealthCheckRunner::from_config(&ProbeConfig::default()).unwrap();

    let result = runner
        .run(Endpoints {
            request_url: format!("http://{}/api/stream/cors-test", addr),
            stream_url: format!("ws://{}/ws/live", addr),
        })
        .settled()
        .await;

    assert!(!result.is_running);
    assert!(!result.all_passed());
    for outcome in [result.request_probe.unwrap(), result.stream_probe.unwrap()] {
        assert!(!outcome.succeeded());
        assert!(outcome.detail().is_some_and(|d| !d.is_empty()));
    }
}

#[tokio::test]
async fn test_malformed_endpoints_surface_as_failures() {
    let runner = HealthCheckRunner::from_config(&ProbeConfig::default()).unwrap();

    let result = runner
        .run(Endpoints {
            request_url: "definitely not a url".into(),
            stream_url: "also :// broken".into(),
        })
        .settled()
        .await;

    assert!(!result.request_probe.unwrap().succeeded());
    assert!(!result.stream_probe.unwrap().succeeded());
}

#[tokio::test]
async fn test_origin_rejected_by_backend() {
    let (addr, _) = common::start_radio_backend("https://radio.example").await;
    let config = ProbeConfig {
        origin: Some("http://localhost:5173".into()),
        ..ProbeConfig::default()
    };
    let probe = RequestProbe::from_config(&config).unwrap();

    let outcome = probe.check(&format!("http://{}/api/stream/cors-test", addr)).await;

    assert!(!outcome.succeeded());
    assert!(outcome.detail().unwrap().starts_with("CORS rejected"));
}

#[tokio::test]
async fn test_origin_allowed_by_backend() {
    let (addr, _) = common::start_radio_backend("http://localhost:5173").await;
    let config = ProbeConfig {
        origin: Some("http://localhost:5173".into()),
        ..ProbeConfig::default()
    };
    let probe = RequestProbe::from_config(&config).unwrap();

    let outcome = probe.check(&format!("http://{}/api/stream/cors-test", addr)).await;
    assert!(outcome.succeeded());
}

#[tokio::test]
async fn test_request_timeout_when_configured() {
    let silent = common::start_silent_backend().await;
    let config = ProbeConfig {
        request_timeout_ms: Some(200),
        ..ProbeConfig::default()
    };
    let probe = RequestProbe::from_config(&config).unwrap();

    let outcome = probe.check(&format!("http://{}/api/stream/cors-test", silent)).await;
    assert_eq!(outcome.detail(), Some("Request timeout after 200 ms"));
}

#[tokio::test]
async fn test_server_dropping_handshake_is_a_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });

    let outcome = probe_stream(
        &WebSocketDialer,
        &format!("ws://{}/ws/live", addr),
        Duration::from_secs(5),
    )
    .await;

    assert!(!outcome.succeeded());
    assert!(outcome.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_http_endpoint_is_not_a_websocket() {
    let api = common::start_programmable_backend(|| async { (404, "{}".into()) }).await;

    let outcome = probe_stream(
        &WebSocketDialer,
        &format!("ws://{}/ws/live", api),
        Duration::from_secs(5),
    )
    .await;

    assert!(!outcome.succeeded());
    assert!(!outcome.detail().unwrap().is_empty());
}
