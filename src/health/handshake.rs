//! WebSocket handshake state machine.
//!
//! # States
//! ```text
//! Idle → Connecting → Open → Closing → Succeeded
//!                   → Failed(error)
//!                   → Failed(abnormal close)
//!                   → Failed(timeout)
//! ```
//!
//! Only the first terminal event moves the machine out of `Connecting`.
//! Every later event, including a stale deadline, is ignored.

use crate::health::error::ProbeError;

/// Close code for a clean shutdown.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Close code reported when the connection dropped without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Fallback detail when the transport gives no error text.
pub const GENERIC_STREAM_ERROR: &str = "WebSocket connection error";

/// Lifecycle event observed on a connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The handshake completed.
    Open,
    /// Transport error, with the underlying text when the transport gave one.
    Error(Option<String>),
    /// The connection closed with this code.
    Closed(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeState {
    Idle,
    Connecting,
    /// Open was observed; the probe is tearing the connection down.
    Closing,
    Succeeded,
    Failed(ProbeError),
}

/// Resolve-once handshake tracker.
#[derive(Debug)]
pub struct Handshake {
    state: HandshakeState,
}

impl Handshake {
    pub fn new() -> Self {
        Self {
            state: HandshakeState::Idle,
        }
    }

    pub fn state(&self) -> &HandshakeState {
        &self.state
    }

    /// Mark the connection attempt as started.
    pub fn begin(&mut self) {
        if self.state == HandshakeState::Idle {
            self.state = HandshakeState::Connecting;
        }
    }

    /// Feed one event. Returns `true` if this event settled the handshake.
    pub fn apply(&mut self, event: StreamEvent) -> bool {
        if self.state != HandshakeState::Connecting {
            tracing::trace!(?event, state = ?self.state, "Ignoring event after settlement");
            return false;
        }

        self.state = match event {
            StreamEvent::Open => HandshakeState::Closing,
            StreamEvent::Error(text) => HandshakeState::Failed(ProbeError::transport(
                text.unwrap_or_default(),
                GENERIC_STREAM_ERROR,
            )),
            // A clean close before open is not terminal; the deadline decides.
            StreamEvent::Closed(NORMAL_CLOSURE) => return false,
            StreamEvent::Closed(code) => HandshakeState::Failed(ProbeError::AbnormalClose(code)),
        };
        true
    }

    /// The deadline fired. Returns `true` if it settled the handshake.
    pub fn expire(&mut self) -> bool {
        if self.state != HandshakeState::Connecting {
            return false;
        }
        self.state = HandshakeState::Failed(ProbeError::StreamTimeout);
        true
    }

    /// Teardown after a successful open has completed.
    pub fn finish_close(&mut self) {
        if self.state == HandshakeState::Closing {
            self.state = HandshakeState::Succeeded;
        }
    }

    /// Whether a terminal event has been accepted.
    pub fn is_settled(&self) -> bool {
        !matches!(self.state, HandshakeState::Idle | HandshakeState::Connecting)
    }

    /// Outcome of the handshake, once settled.
    pub fn verdict(&self) -> Option<Result<(), ProbeError>> {
        match &self.state {
            HandshakeState::Idle | HandshakeState::Connecting => None,
            HandshakeState::Closing | HandshakeState::Succeeded => Some(Ok(())),
            HandshakeState::Failed(err) => Some(Err(err.clone())),
        }
    }
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}
