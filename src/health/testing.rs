//! Scripted stream transport for driving the probe without sockets.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::health::handshake::StreamEvent;
use crate::health::stream::{ConnectionAttempt, StreamDialer};

/// Replays `(delay, event)` pairs on every dial.
#[derive(Clone)]
pub struct ScriptedDialer {
    script: Vec<(Duration, StreamEvent)>,
    consumed: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedDialer {
    pub fn new(script: Vec<(Duration, StreamEvent)>) -> Self {
        Self {
            script,
            consumed: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Events delivered across all attempts.
    pub fn events_consumed(&self) -> usize {
        self.consumed.load(Ordering::SeqCst)
    }

    /// `close()` calls across all attempts.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl StreamDialer for ScriptedDialer {
    type Attempt = ScriptedAttempt;

    fn dial(&self, _url: &str) -> ScriptedAttempt {
        ScriptedAttempt {
            pending: self.script.iter().cloned().collect(),
            consumed: Arc::clone(&self.consumed),
            closes: Arc::clone(&self.closes),
            closed: false,
        }
    }
}

pub struct ScriptedAttempt {
    pending: VecDeque<(Duration, StreamEvent)>,
    consumed: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    closed: bool,
}

impl ConnectionAttempt for ScriptedAttempt {
    async fn next_event(&mut self) -> Option<StreamEvent> {
        let delay = self.pending.front()?.0;
        tokio::time::sleep(delay).await;
        let (_, event) = self.pending.pop_front()?;
        self.consumed.fetch_add(1, Ordering::SeqCst);
        Some(event)
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}
