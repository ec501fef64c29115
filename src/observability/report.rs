//! Human-readable status reporting.
//!
//! Monitors emit one line per connection event to a [`Reporter`]. Lines are
//! prefixed with the endpoint: `Connection to 10.0.0.1:80 established.`

use crate::monitor::ServerEndpoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
}

/// Sink for monitor status lines.
pub trait Reporter: Send + Sync {
    fn report(&self, message: &str, severity: Severity);
}

/// What happened to the idle connection, as worded in status lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Established,
    Failed,
    Lost,
}

impl ConnectionEvent {
    fn as_str(self) -> &'static str {
        match self {
            ConnectionEvent::Established => "established",
            ConnectionEvent::Failed => "failed",
            ConnectionEvent::Lost => "lost",
        }
    }
}

pub fn report_prefix(server: &ServerEndpoint) -> String {
    format!("Connection to {server}")
}

/// `Connection to <host>:<port> <event>.`
pub fn status_line(server: &ServerEndpoint, event: ConnectionEvent) -> String {
    format!("{} {}.", report_prefix(server), event.as_str())
}

/// Forwards reports to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => tracing::info!(monitor = "IdleConnection", "{message}"),
            Severity::Warning => tracing::warn!(monitor = "IdleConnection", "{message}"),
        }
    }
}
