//! Health-check orchestration.
//!
//! # Responsibilities
//! - Publish a "running" snapshot synchronously when a run is triggered
//! - Drive both probes concurrently and join them
//! - Publish the aggregate once both have settled
//!
//! # Design Decisions
//! - Results flow through a `watch` channel: readers only ever see a whole
//!   snapshot, never a half-updated one
//! - Re-triggering while a run is in flight aborts it (cancel-and-restart);
//!   publication is keyed on `run_id` so a superseded run never lands
//! - Scheduled triggers never supersede: a tick that lands while a run is
//!   in flight is skipped, so slow probes still get to report

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ProbeConfig;
use crate::health::outcome::{now_millis, Endpoints, HealthCheckResult};
use crate::health::request::RequestProbe;
use crate::health::stream::{probe_stream, StreamDialer, WebSocketDialer};
use crate::observability::metrics;

struct Probes<D> {
    request: RequestProbe,
    dialer: D,
    stream_timeout: Duration,
}

impl<D: StreamDialer> Probes<D> {
    async fn execute(&self, run_id: Uuid, started_at: u64, endpoints: &Endpoints) -> HealthCheckResult {
        let (request, stream) = tokio::join!(
            self.request.check(&endpoints.request_url),
            probe_stream(&self.dialer, &endpoints.stream_url, self.stream_timeout),
        );

        metrics::record_probe(&request);
        metrics::record_probe(&stream);

        HealthCheckResult::finished(run_id, started_at, request, stream)
    }
}

/// Runs the two reachability probes and publishes their aggregate.
pub struct HealthCheckRunner<D = WebSocketDialer> {
    probes: Arc<Probes<D>>,
    state: Arc<watch::Sender<HealthCheckResult>>,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

impl HealthCheckRunner<WebSocketDialer> {
    /// Runner with the production HTTP client and WebSocket transport.
    pub fn from_config(config: &ProbeConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_dialer(
            RequestProbe::from_config(config)?,
            WebSocketDialer,
            Duration::from_millis(config.stream_timeout_ms),
        ))
    }
}

impl<D: StreamDialer> HealthCheckRunner<D> {
    pub fn with_dialer(request: RequestProbe, dialer: D, stream_timeout: Duration) -> Self {
        let (tx, _) = watch::channel(HealthCheckResult::idle());
        Self {
            probes: Arc::new(Probes {
                request,
                dialer,
                stream_timeout,
            }),
            state: Arc::new(tx),
            in_flight: Mutex::new(None),
        }
    }

    /// Trigger a run.
    ///
    /// The running snapshot is visible before this returns; the probes
    /// proceed on the Tokio runtime. Must be called from within a runtime.
    pub fn run(&self, endpoints: Endpoints) -> RunHandle {
        let run_id = Uuid::new_v4();
        let started_at = now_millis();
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = in_flight.take() {
            if !previous.is_finished() {
                tracing::info!(run_id = %run_id, "Superseding in-flight run");
                previous.abort();
            }
        }

        self.state.send_replace(HealthCheckResult::running(run_id, started_at));
        tracing::info!(
            run_id = %run_id,
            request_url = %endpoints.request_url,
            stream_url = %endpoints.stream_url,
            "Connectivity check started"
        );

        let probes = Arc::clone(&self.probes);
        let state = Arc::clone(&self.state);
        let span = tracing::info_span!("health_check", run_id = %run_id);

        *in_flight = Some(tokio::spawn(
            async move {
                let result = probes.execute(run_id, started_at, &endpoints).await;
                let passed = result.all_passed();

                let published = state.send_if_modified(|current| {
                    if current.run_id != run_id {
                        return false;
                    }
                    *current = result;
                    true
                });

                if published {
                    tracing::info!(passed, "Connectivity check finished");
                } else {
                    tracing::debug!("Discarding result of superseded run");
                }
            }
            .instrument(span),
        ));

        RunHandle {
            run_id,
            rx: self.state.subscribe(),
        }
    }

    /// Trigger a run unless one is already in flight.
    ///
    /// Used for interval ticks, where restarting a run slower than the
    /// interval would mean no run ever settles.
    pub fn run_scheduled(&self, endpoints: Endpoints) -> Option<RunHandle> {
        if self.is_running() {
            tracing::debug!("Run still in flight, skipping scheduled trigger");
            return None;
        }
        Some(self.run(endpoints))
    }

    /// Whether the current snapshot belongs to an unsettled run.
    pub fn is_running(&self) -> bool {
        self.state.borrow().is_running
    }

    /// Receiver over the current result, for display collaborators.
    pub fn subscribe(&self) -> watch::Receiver<HealthCheckResult> {
        self.state.subscribe()
    }

    /// Clone of the current result.
    pub fn snapshot(&self) -> HealthCheckResult {
        self.state.borrow().clone()
    }
}

impl<D> Drop for HealthCheckRunner<D> {
    fn drop(&mut self) {
        let in_flight = self.in_flight.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = in_flight.take() {
            task.abort();
        }
    }
}

/// Handle to one triggered run.
pub struct RunHandle {
    run_id: Uuid,
    rx: watch::Receiver<HealthCheckResult>,
}

impl RunHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Wait for this run to settle.
    ///
    /// Resolves to this run's aggregate, or to the aggregate of the run that
    /// superseded it. Superseded runs never publish, so the next settled
    /// snapshot is always the newest run's.
    pub async fn settled(mut self) -> HealthCheckResult {
        let settled = self
            .rx
            .wait_for(|result| !result.is_running)
            .await
            .map(|result| result.clone());

        match settled {
            Ok(result) => result,
            // Runner dropped mid-run; hand back whatever was last published.
            Err(_) => self.rx.borrow().clone(),
        }
    }
}
