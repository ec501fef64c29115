//! In-process verdict board.
//!
//! # Responsibilities
//! - Hold the last verdict received for every monitored server
//! - Log verdict transitions
//! - Export a per-server health gauge

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Mutex;

use dashmap::DashMap;

use crate::health::state::{Coordinator, Verdict};
use crate::monitor::ServerEndpoint;
use crate::observability::metrics;

/// Health of a single server as seen by the board.
#[derive(Debug, Default)]
pub struct ServerHealth {
    /// Current verdict (0=Unknown, 1=Up, 2=Down).
    state: AtomicU8,
    /// Number of times the verdict changed.
    transitions: AtomicUsize,
    /// Reason attached to the last Down verdict.
    last_reason: Mutex<Option<String>>,
}

impl ServerHealth {
    pub fn verdict(&self) -> Verdict {
        Verdict::from(self.state.load(Ordering::Relaxed))
    }

    pub fn transitions(&self) -> usize {
        self.transitions.load(Ordering::Relaxed)
    }

    pub fn last_reason(&self) -> Option<String> {
        self.last_reason
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Store a verdict, returning the previous one.
    fn set(&self, verdict: Verdict) -> Verdict {
        let previous = Verdict::from(self.state.swap(verdict as u8, Ordering::Relaxed));
        if previous != verdict {
            self.transitions.fetch_add(1, Ordering::Relaxed);
        }
        previous
    }
}

/// A [`Coordinator`] that records verdicts per server.
///
/// It does not decide pool membership; it is the daemon's view of which
/// servers are alive.
#[derive(Debug, Default)]
pub struct HealthBoard {
    servers: DashMap<ServerEndpoint, ServerHealth>,
}

impl HealthBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a server with an unknown verdict.
    pub fn register(&self, server: &ServerEndpoint) {
        self.servers.entry(server.clone()).or_default();
    }

    pub fn verdict(&self, server: &ServerEndpoint) -> Verdict {
        self.servers
            .get(server)
            .map(|health| health.verdict())
            .unwrap_or_default()
    }

    pub fn last_reason(&self, server: &ServerEndpoint) -> Option<String> {
        self.servers.get(server).and_then(|health| health.last_reason())
    }

    pub fn transitions(&self, server: &ServerEndpoint) -> usize {
        self.servers.get(server).map_or(0, |health| health.transitions())
    }

    /// Number of servers currently up.
    pub fn up_count(&self) -> usize {
        self.servers
            .iter()
            .filter(|entry| entry.value().verdict() == Verdict::Up)
            .count()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Verdicts of all servers, sorted by endpoint.
    pub fn snapshot(&self) -> Vec<(ServerEndpoint, Verdict)> {
        let mut all: Vec<_> = self
            .servers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().verdict()))
            .collect();
        all.sort_by(|a, b| a.0.to_string().cmp(&b.0.to_string()));
        all
    }

    fn record(&self, server: &ServerEndpoint, verdict: Verdict, reason: Option<&str>) {
        let health = self.servers.entry(server.clone()).or_default();
        if let Some(reason) = reason {
            *health
                .last_reason
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(reason.to_string());
        }
        let previous = health.set(verdict);
        drop(health);

        if previous != verdict {
            match reason {
                Some(reason) => tracing::warn!(server = %server, from = %previous, to = %verdict, reason, "Server verdict changed"),
                None => tracing::info!(server = %server, from = %previous, to = %verdict, "Server verdict changed"),
            }
        }
        metrics::record_server_health(server, verdict);
    }
}

impl Coordinator for HealthBoard {
    fn on_up(&self, server: &ServerEndpoint) {
        self.record(server, Verdict::Up, None);
    }

    fn on_down(&self, server: &ServerEndpoint, reason: &str) {
        self.record(server, Verdict::Down, Some(reason));
    }
}
