//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve every server's monitor config
//! - Register servers with the coordinator
//! - Start one idle connection monitor per server
//!
//! # Design Decisions
//! - Fail fast: a bad monitor config aborts startup before anything runs
//! - Monitors stop in the order they were started

use std::sync::Arc;

use crate::config::{ConfigError, MonitorConfig, MonitorSettings};
use crate::health::HealthBoard;
use crate::monitor::IdleConnectionMonitor;
use crate::observability::Reporter;

/// All monitors run by the daemon.
pub struct MonitorFleet {
    monitors: Vec<IdleConnectionMonitor>,
}

impl MonitorFleet {
    /// Build a monitor for every configured server without starting them.
    pub fn build(
        settings: &MonitorSettings,
        board: Arc<HealthBoard>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self, ConfigError> {
        let mut monitors = Vec::with_capacity(settings.servers.len());
        for server in &settings.servers {
            let config = MonitorConfig::from_provider(&server.monitor_table(&settings.monitor))?;
            let endpoint = server.endpoint();
            board.register(&endpoint);
            monitors.push(IdleConnectionMonitor::new(
                endpoint,
                config,
                board.clone(),
                reporter.clone(),
            ));
        }
        Ok(Self { monitors })
    }

    /// Start every monitor. Must be called within a tokio runtime.
    pub fn run(&mut self) {
        for monitor in &mut self.monitors {
            monitor.run();
        }
        tracing::info!(servers = self.monitors.len(), "All monitors started");
    }

    /// Stop every monitor and wait for their tasks to exit.
    pub async fn shutdown(&mut self) {
        for monitor in &mut self.monitors {
            monitor.stop();
        }
        for monitor in &mut self.monitors {
            monitor.shutdown().await;
        }
        tracing::info!(servers = self.monitors.len(), "All monitors stopped");
    }

    pub fn monitors(&self) -> &[IdleConnectionMonitor] {
        &self.monitors
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}
