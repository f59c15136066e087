//! connectivity-check
//!
//! Command-line front end for the connectivity health-check.
//!
//! # Architecture Overview
//!
//! ```text
//!   connectivity.toml ──▶ config ──▶ Endpoints
//!   CONNCHECK_* env   ──┘              │
//!   --api-url/--ws-url ─┘              ▼
//!                              ┌──────────────────┐   GET /api/stream/cors-test
//!   run / watch trigger ──────▶│ HealthCheckRunner│──────────────────────────▶ backend
//!                              │  request probe   │   WS  /ws/live
//!                              │  stream probe    │──────────────────────────▶ backend
//!                              └────────┬─────────┘
//!                                       │ watch channel
//!                                       ▼
//!                                    report ──▶ stdout (text | json)
//! ```
//!
//! Exit status is 0 when both probes passed, 1 otherwise.

use clap::{Parser, Subcommand};
use notify::RecommendedWatcher;
use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

use connectivity_check::config::loader::{finalize, load_or_default, UrlOverrides};
use connectivity_check::config::watcher::ConfigWatcher;
use connectivity_check::config::{CheckerConfig, ConfigError};
use connectivity_check::health::HealthCheckRunner;
use connectivity_check::lifecycle::{signals, Shutdown};
use connectivity_check::observability::{logging, metrics};
use connectivity_check::report::{self, OutputFormat};

#[derive(Parser)]
#[command(name = "connectivity-check")]
#[command(about = "Reachability self-test for the radio backend (HTTP + WebSocket)", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file (optional).
    #[arg(short, long, default_value = "connectivity.toml")]
    config: PathBuf,

    /// Report format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Override the request/response base URL.
    #[arg(long)]
    api_url: Option<String>,

    /// Override the WebSocket base URL.
    #[arg(long)]
    ws_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy, Default)]
enum Commands {
    /// Run both probes once and print the result
    #[default]
    Run,
    /// Re-run on an interval and whenever the config file changes
    Watch,
    /// Print the resolved configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();
    let config = load(&cli)?;

    logging::init(&config.observability)?;

    tracing::info!(
        environment = %config.environment,
        stream_timeout_ms = config.probes.stream_timeout_ms,
        request_timeout_ms = ?config.probes.request_timeout_ms,
        "connectivity-check v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    match cli.command.unwrap_or_default() {
        Commands::Run => run_once(&config, cli.format).await,
        Commands::Watch => watch(config, &cli).await,
        Commands::ShowConfig => {
            let endpoints = config.endpoints();
            println!("{}", toml::to_string_pretty(&config)?);
            println!("# request_url = {}", endpoints.request_url);
            println!("# stream_url  = {}", endpoints.stream_url);
            Ok(ExitCode::SUCCESS)
        }
    }
}

impl Cli {
    fn overrides(&self) -> UrlOverrides {
        UrlOverrides {
            api_base_url: self.api_url.clone(),
            ws_base_url: self.ws_url.clone(),
        }
    }
}

fn load(cli: &Cli) -> Result<CheckerConfig, ConfigError> {
    finalize(load_or_default(&cli.config)?, &cli.overrides())
}

fn exit_code(passed: bool) -> ExitCode {
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run_once(config: &CheckerConfig, format: OutputFormat) -> Result<ExitCode, Box<dyn Error>> {
    let runner = HealthCheckRunner::from_config(&config.probes)?;
    let endpoints = config.endpoints();

    let result = runner.run(endpoints.clone()).settled().await;
    println!("{}", report::render(&result, &endpoints, format).trim_end());

    Ok(exit_code(result.all_passed()))
}

async fn watch(mut config: CheckerConfig, cli: &Cli) -> Result<ExitCode, Box<dyn Error>> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    // Keep the watcher alive for the whole loop.
    let (_watcher, mut updates) = start_watcher(cli, &config);

    let mut runner = HealthCheckRunner::from_config(&config.probes)?;
    let mut results = runner.subscribe();
    let mut endpoints = config.endpoints();
    let mut ticker = schedule(&config);
    let mut last_passed = false;

    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            _ = ticker.tick() => {
                runner.run_scheduled(endpoints.clone());
            }
            Some(new_config) = next_update(&mut updates) => {
                let new_config = match finalize(new_config, &cli.overrides()) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::error!("Reloaded config rejected: {}. Keeping current configuration.", e);
                        continue;
                    }
                };
                match HealthCheckRunner::from_config(&new_config.probes) {
                    Ok(new_runner) => {
                        runner = new_runner;
                        results = runner.subscribe();
                        config = new_config;
                        endpoints = config.endpoints();
                        ticker = schedule(&config);
                        tracing::info!(
                            request_url = %endpoints.request_url,
                            stream_url = %endpoints.stream_url,
                            "Configuration reloaded"
                        );
                    }
                    Err(e) => tracing::error!(error = %e, "Failed to rebuild runner, keeping current one"),
                }
            }
            Ok(()) = results.changed() => {
                let snapshot = results.borrow_and_update().clone();
                if !snapshot.is_running {
                    last_passed = snapshot.all_passed();
                    println!("{}", report::render(&snapshot, &endpoints, cli.format).trim_end());
                }
            }
        }
    }

    tracing::info!("Watch stopped");
    Ok(exit_code(last_passed))
}

fn schedule(config: &CheckerConfig) -> time::Interval {
    let mut ticker = time::interval(Duration::from_secs(config.watch.interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn start_watcher(
    cli: &Cli,
    config: &CheckerConfig,
) -> (Option<RecommendedWatcher>, Option<mpsc::UnboundedReceiver<CheckerConfig>>) {
    if !config.watch.reload_on_change || !cli.config.exists() {
        return (None, None);
    }

    let (watcher, updates) = ConfigWatcher::new(&cli.config);
    match watcher.run() {
        Ok(watcher) => (Some(watcher), Some(updates)),
        Err(e) => {
            tracing::warn!(error = %e, "Config hot reload unavailable");
            (None, None)
        }
    }
}

async fn next_update(
    updates: &mut Option<mpsc::UnboundedReceiver<CheckerConfig>>,
) -> Option<CheckerConfig> {
    match updates {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
