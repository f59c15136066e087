//! Shared utilities for integration testing.

#![allow(dead_code)]

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::header;
use axum::routing::get;
use axum::{Json, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

/// Start a programmable HTTP backend. Returns its address.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let (status, body) = f().await;
                let status_line = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    599 => "599 Network Connect Timeout Error",
                    _ => "200 OK",
                };

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
                tokio::time::sleep(Duration::from_millis(10)).await;
            });
        }
    });

    addr
}

/// Accept TCP connections and never answer them.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// An address with nothing listening on it.
pub fn closed_port() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Counters observed by the mock radio backend.
#[derive(Default)]
pub struct BackendStats {
    pub ws_opened: AtomicUsize,
    pub ws_closed: AtomicUsize,
}

/// Start an axum backend with both diagnostic endpoints.
pub async fn start_radio_backend(allow_origin: &'static str) -> (SocketAddr, Arc<BackendStats>) {
    let stats = Arc::new(BackendStats::default());
    let ws_stats = stats.clone();

    let app = Router::new()
        .route(
            "/api/stream/cors-test",
            get(move || async move {
                (
                    [(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin)],
                    Json(serde_json::json!({"status": "ok", "message": "CORS test successful"})),
                )
            }),
        )
        .route(
            "/ws/live",
            get(move |ws: WebSocketUpgrade| {
                let stats = ws_stats.clone();
                async move { ws.on_upgrade(move |socket| track_socket(socket, stats)) }
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, stats)
}

async fn track_socket(mut socket: WebSocket, stats: Arc<BackendStats>) {
    stats.ws_opened.fetch_add(1, Ordering::SeqCst);
    while let Some(Ok(message)) = socket.recv().await {
        if let Message::Close(_) = message {
            break;
        }
    }
    stats.ws_closed.fetch_add(1, Ordering::SeqCst);
}

/// Poll `check` until it holds or `within` elapses.
pub async fn eventually<F: Fn() -> bool>(within: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
