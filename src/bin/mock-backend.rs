//! Local stand-in for the radio backend's diagnostic endpoints.
//!
//! Serves `GET /api/stream/cors-test` and the `/ws/live` WebSocket so the
//! checker can be exercised without the real backend. Failure modes are
//! selectable from the command line.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use clap::{Parser, ValueEnum};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

use connectivity_check::config::ObservabilityConfig;
use connectivity_check::lifecycle::signals::shutdown_signal;
use connectivity_check::observability::logging;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WsMode {
    /// Complete the upgrade
    Accept,
    /// Never answer the upgrade request
    Hang,
    /// Refuse the upgrade with 403
    Reject,
}

#[derive(Parser)]
#[command(name = "mock-backend")]
#[command(about = "Mock radio backend exposing the connectivity diagnostic endpoints", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Status returned by the request endpoint.
    #[arg(long, default_value_t = 200)]
    status: u16,

    #[arg(long, value_enum, default_value_t = WsMode::Accept)]
    ws_mode: WsMode,

    /// Value of Access-Control-Allow-Origin.
    #[arg(long, default_value = "*")]
    allow_origin: String,
}

struct MockState {
    status: StatusCode,
    ws_mode: WsMode,
    allow_origin: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init(&ObservabilityConfig::default())?;

    let state = Arc::new(MockState {
        status: StatusCode::from_u16(args.status)?,
        ws_mode: args.ws_mode,
        allow_origin: args.allow_origin,
    });

    let app = Router::new()
        .route("/api/stream/cors-test", get(cors_test))
        .route("/ws/live", get(ws_live))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        status = args.status,
        ws_mode = ?args.ws_mode,
        "Mock backend listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn cors_test(State(state): State<Arc<MockState>>) -> Response {
    let cors = [(header::ACCESS_CONTROL_ALLOW_ORIGIN, state.allow_origin.clone())];

    if !state.status.is_success() {
        let reason = state.status.canonical_reason().unwrap_or("Error");
        return (state.status, cors, reason).into_response();
    }

    let body = json!({
        "status": "ok",
        "message": "CORS test successful",
        "timestamp": std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0),
    });
    (state.status, cors, Json(body)).into_response()
}

async fn ws_live(State(state): State<Arc<MockState>>, ws: WebSocketUpgrade) -> Response {
    match state.ws_mode {
        WsMode::Accept => ws.on_upgrade(handle_socket),
        WsMode::Hang => std::future::pending::<Response>().await,
        WsMode::Reject => (StatusCode::FORBIDDEN, "upgrade refused").into_response(),
    }
}

async fn handle_socket(mut socket: WebSocket) {
    tracing::debug!("WebSocket client connected");
    if socket.send(Message::Text("connected".into())).await.is_err() {
        return;
    }
    while let Some(Ok(message)) = socket.recv().await {
        if let Message::Close(frame) = message {
            tracing::debug!(?frame, "WebSocket client closed");
            break;
        }
    }
}
