//! Streaming handshake probe.
//!
//! # Responsibilities
//! - Dial the WebSocket endpoint
//! - Race the attempt's lifecycle events against the handshake window
//! - Close the connection as soon as it opens, or tear it down on timeout
//!
//! # Design Decisions
//! - The transport sits behind [`StreamDialer`] so the race can be driven by
//!   scripted events
//! - Settlement is owned by [`Handshake`]; the driver only feeds it
//! - Dropping a pending handshake closes the socket, so a timeout releases
//!   the connection without waiting on the peer

use futures_util::StreamExt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{self, Instant};
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::handshake::client::Response;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::health::error::ProbeError;
use crate::health::handshake::{Handshake, StreamEvent, ABNORMAL_CLOSURE};
use crate::health::outcome::{ProbeKind, ProbeOutcome};
use crate::observability::metrics;

/// Close code used when a close frame carries no status.
const NO_STATUS_RECEIVED: u16 = 1005;

/// Upper bound on waiting for the peer to acknowledge our close frame.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// One in-flight connection attempt.
pub trait ConnectionAttempt: Send {
    /// Next lifecycle event, or `None` once the attempt has nothing more to
    /// report. Must be cancel-safe: it is raced against the deadline.
    fn next_event(&mut self) -> impl Future<Output = Option<StreamEvent>> + Send;

    /// Release the underlying connection. Idempotent.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Starts connection attempts.
pub trait StreamDialer: Send + Sync + 'static {
    type Attempt: ConnectionAttempt;

    fn dial(&self, url: &str) -> Self::Attempt;
}

/// Run the handshake probe against `url` with the given window.
pub async fn probe_stream<D: StreamDialer>(dialer: &D, url: &str, window: Duration) -> ProbeOutcome {
    let started = Instant::now();
    let mut handshake = Handshake::new();
    let mut attempt = dialer.dial(url);
    handshake.begin();

    let deadline = time::sleep(window);
    tokio::pin!(deadline);
    let mut exhausted = false;

    while !handshake.is_settled() {
        tokio::select! {
            event = attempt.next_event(), if !exhausted => match event {
                Some(event) => {
                    tracing::debug!(url = %url, ?event, "Stream probe event");
                    handshake.apply(event);
                }
                None => exhausted = true,
            },
            _ = &mut deadline => {
                handshake.expire();
            }
        }
    }

    // Success and timeout both leave a live connection behind.
    attempt.close().await;
    handshake.finish_close();

    let elapsed = started.elapsed();
    match handshake.verdict().unwrap_or(Err(ProbeError::StreamTimeout)) {
        Ok(()) => {
            tracing::debug!(url = %url, elapsed_ms = elapsed.as_millis() as u64, "Stream probe succeeded");
            ProbeOutcome::success(ProbeKind::Stream, None, elapsed)
        }
        Err(err) => {
            tracing::warn!(url = %url, error = %err, class = err.class(), "Stream probe failed");
            metrics::record_failure_class(ProbeKind::Stream.label(), err.class());
            ProbeOutcome::failure(ProbeKind::Stream, &err, elapsed)
        }
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Connecting = Pin<Box<dyn Future<Output = Result<(WsStream, Response), WsError>> + Send>>;

/// Dials real WebSocket endpoints with `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketDialer;

impl StreamDialer for WebSocketDialer {
    type Attempt = WebSocketAttempt;

    fn dial(&self, url: &str) -> WebSocketAttempt {
        WebSocketAttempt {
            state: AttemptState::Connecting(Box::pin(connect_async(url.to_owned()))),
        }
    }
}

enum AttemptState {
    Connecting(Connecting),
    Open(Box<WsStream>),
    Done,
}

pub struct WebSocketAttempt {
    state: AttemptState,
}

impl ConnectionAttempt for WebSocketAttempt {
    async fn next_event(&mut self) -> Option<StreamEvent> {
        match &mut self.state {
            AttemptState::Connecting(connecting) => {
                let result = connecting.as_mut().await;
                match result {
                    Ok((stream, _response)) => {
                        self.state = AttemptState::Open(Box::new(stream));
                        Some(StreamEvent::Open)
                    }
                    Err(err) => {
                        self.state = AttemptState::Done;
                        Some(classify(err))
                    }
                }
            }
            AttemptState::Open(stream) => {
                let code = loop {
                    match stream.next().await {
                        Some(Ok(Message::Close(frame))) => {
                            break frame.map(|f| u16::from(f.code)).unwrap_or(NO_STATUS_RECEIVED);
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(_)) | None => break ABNORMAL_CLOSURE,
                    }
                };
                self.state = AttemptState::Done;
                Some(StreamEvent::Closed(code))
            }
            AttemptState::Done => None,
        }
    }

    async fn close(&mut self) {
        match std::mem::replace(&mut self.state, AttemptState::Done) {
            AttemptState::Open(mut stream) => {
                if let Err(e) = stream.close(None).await {
                    tracing::debug!(error = %e, "Close frame not sent");
                }
                let drain = async { while let Some(Ok(_)) = stream.next().await {} };
                if time::timeout(CLOSE_GRACE, drain).await.is_err() {
                    tracing::debug!("Peer did not acknowledge close, dropping connection");
                }
            }
            AttemptState::Connecting(_) => {
                tracing::debug!("Abandoning pending handshake");
            }
            AttemptState::Done => {}
        }
    }
}

/// Map a connect failure onto the event a browser would have surfaced first.
fn classify(err: WsError) -> StreamEvent {
    match err {
        WsError::ConnectionClosed
        | WsError::AlreadyClosed
        | WsError::Protocol(ProtocolError::HandshakeIncomplete) => StreamEvent::Closed(ABNORMAL_CLOSURE),
        WsError::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            StreamEvent::Closed(ABNORMAL_CLOSURE)
        }
        WsError::Http(response) => StreamEvent::Error(Some(format!(
            "WebSocket handshake rejected: HTTP {}",
            response.status()
        ))),
        other => StreamEvent::Error(Some(other.to_string())),
    }
}
