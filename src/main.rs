//! Idle connection monitor daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml ──▶ config::loader ──▶ MonitorSettings
//!                                           │
//!                                           ▼
//!                               lifecycle::MonitorFleet
//!                      ┌────────────────┼────────────────┐
//!                      ▼                ▼                ▼
//!              IdleConnectionMonitor  (one per server, one task each)
//!                      │  idle TCP connection, keepalive tuned
//!                      ▼
//!         state machine ──verdicts──▶ health::HealthBoard ──▶ gauge
//!                       ──reports───▶ observability::TracingReporter
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use idle_monitor::config::loader::load_config;
use idle_monitor::health::HealthBoard;
use idle_monitor::lifecycle::{signals, MonitorFleet, Shutdown};
use idle_monitor::observability::{self, TracingReporter};

#[derive(Parser)]
#[command(name = "idle-monitor")]
#[command(about = "Monitor servers by keeping an idle TCP connection open to each", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "idle-monitor.toml")]
    config: PathBuf,

    /// Override the configured log level.
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = load_config(&cli.config)?;

    if cli.check {
        println!(
            "{}: {} server(s), configuration OK",
            cli.config.display(),
            settings.servers.len()
        );
        return Ok(());
    }

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(settings.observability.log_level.as_str());
    observability::logging::init(level)?;

    tracing::info!(
        config = %cli.config.display(),
        servers = settings.servers.len(),
        "idle-monitor v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if settings.observability.metrics_enabled {
        match settings.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let board = Arc::new(HealthBoard::new());
    let mut fleet = MonitorFleet::build(&settings, board.clone(), Arc::new(TracingReporter))?;
    if fleet.is_empty() {
        tracing::warn!("No servers configured, nothing to monitor");
    }

    let shutdown = Arc::new(Shutdown::new());
    let mut shutdown_rx = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown.clone());

    fleet.run();
    let _ = shutdown_rx.recv().await;

    tracing::info!("Shutting down monitors");
    fleet.shutdown().await;

    for (server, verdict) in board.snapshot() {
        tracing::info!(server = %server, verdict = %verdict, "Final verdict");
    }
    tracing::info!(
        up = board.up_count(),
        total = board.len(),
        "Shutdown complete"
    );
    Ok(())
}
