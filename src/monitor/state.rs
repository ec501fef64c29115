//! Reconnection state machine.
//!
//! # States
//! ```text
//! Stopped ──run()──▶ Connecting ──established──▶ Connected
//!                        ▲  │                        │
//!                        │  └─failed─▶ Backoff ◀─lost (unclean)─┤
//!                        │               │                      │
//!                        ├──timer fires──┘                      │
//!                        └───────── lost (clean) ───────────────┘
//! any ──stop()──▶ Stopped
//! ```
//!
//! # Design Decisions
//! - A clean close may be an idle timeout: reconnect at once, keep the verdict
//! - An unclean close or failed connect flips to Down before any retry
//! - Every handler checks `active` first; an inactive machine does nothing
//! - The machine never sleeps or connects itself, it returns a [`Directive`]

use std::sync::Arc;
use std::time::Duration;

use crate::config::MonitorConfig;
use crate::health::{Coordinator, Verdict};
use crate::monitor::ServerEndpoint;
use crate::observability::metrics;
use crate::observability::report::{status_line, ConnectionEvent, Reporter, Severity};
use crate::resilience::BackoffPolicy;

/// Where the machine is in its connect/reconnect cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stopped,
    Connecting,
    Connected,
    Backoff,
}

/// Result of applying keepalive options on a fresh connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeepaliveOutcome {
    Disabled,
    Applied,
    Failed(String),
}

/// A connection lifecycle event produced by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionOutcome {
    ConnectFailed(String),
    ConnectionEstablished { keepalive: KeepaliveOutcome },
    ConnectionLost { reason: String, clean: bool },
}

/// Why a connect attempt is being made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptKind {
    Initial,
    FastReconnect,
    SlowReconnect,
}

/// A connect attempt for the driver to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectRequest {
    /// Wait this long before connecting.
    pub delay: Duration,
    /// Give up on the handshake after this long.
    pub timeout: Duration,
    pub kind: AttemptKind,
}

/// What the driver should do after an event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Schedule another connect attempt.
    Connect(ConnectRequest),
    /// Keep the connection open and wait for it to end.
    Hold,
    /// Monitoring stopped; do nothing further.
    Halt,
}

/// Per-server monitor state, owned by exactly one monitor.
pub struct MonitorState {
    server: ServerEndpoint,
    config: MonitorConfig,
    coordinator: Arc<dyn Coordinator>,
    reporter: Arc<dyn Reporter>,
    active: bool,
    phase: Phase,
    backoff: BackoffPolicy,
    last_verdict: Verdict,
}

impl MonitorState {
    pub fn new(
        server: ServerEndpoint,
        config: MonitorConfig,
        coordinator: Arc<dyn Coordinator>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        let backoff = BackoffPolicy::new(config.initial_reconnect_delay, config.max_reconnect_delay);
        Self {
            server,
            config,
            coordinator,
            reporter,
            active: false,
            phase: Phase::Stopped,
            backoff,
            last_verdict: Verdict::Unknown,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn last_verdict(&self) -> Verdict {
        self.last_verdict
    }

    /// Delay the next slow reconnect will wait.
    pub fn current_delay(&self) -> Duration {
        self.backoff.current()
    }

    /// Begin monitoring: connect right away with a fresh backoff.
    pub fn start(&mut self) -> ConnectRequest {
        self.active = true;
        self.phase = Phase::Connecting;
        self.backoff.reset();
        tracing::debug!(server = %self.server, "Idle connection monitor started");
        ConnectRequest {
            delay: Duration::ZERO,
            timeout: self.config.connect_timeout,
            kind: AttemptKind::Initial,
        }
    }

    /// Stop monitoring. Every later event becomes a no-op. Idempotent.
    pub fn stop(&mut self) {
        if self.active {
            tracing::debug!(server = %self.server, "Idle connection monitor stopped");
        }
        self.active = false;
        self.phase = Phase::Stopped;
    }

    /// A scheduled reconnect timer fired. Returns whether to go ahead and
    /// connect.
    pub fn on_timer_fired(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.phase = Phase::Connecting;
        true
    }

    pub fn handle(&mut self, outcome: ConnectionOutcome) -> Directive {
        if !self.active {
            tracing::trace!(server = %self.server, ?outcome, "Ignoring event for stopped monitor");
            return Directive::Halt;
        }

        match outcome {
            ConnectionOutcome::ConnectFailed(reason) => self.connect_failed(&reason),
            ConnectionOutcome::ConnectionEstablished { keepalive } => self.established(keepalive),
            ConnectionOutcome::ConnectionLost { reason, clean: true } => self.lost_cleanly(&reason),
            ConnectionOutcome::ConnectionLost { reason, clean: false } => self.lost_uncleanly(&reason),
        }
    }

    fn connect_failed(&mut self, reason: &str) -> Directive {
        metrics::record_connect_failure(&self.server);
        self.result_down(reason);
        self.reporter.report(
            &status_line(&self.server, ConnectionEvent::Failed),
            Severity::Warning,
        );
        self.retry()
    }

    fn established(&mut self, keepalive: KeepaliveOutcome) -> Directive {
        self.phase = Phase::Connected;
        metrics::record_established(&self.server);

        if let KeepaliveOutcome::Failed(reason) = keepalive {
            tracing::warn!(server = %self.server, %reason, "Keepalive setup failed");
            self.reporter.report(
                &format!(
                    "{}: keepalive setup failed ({reason}).",
                    crate::observability::report::report_prefix(&self.server)
                ),
                Severity::Warning,
            );
        }

        self.result_up();
        self.backoff.reset();
        self.reporter.report(
            &status_line(&self.server, ConnectionEvent::Established),
            Severity::Info,
        );
        Directive::Hold
    }

    fn lost_cleanly(&mut self, reason: &str) -> Directive {
        metrics::record_connection_lost(&self.server, true);
        tracing::debug!(server = %self.server, reason, "Connection closed cleanly, reconnecting fast");

        self.phase = Phase::Connecting;
        Directive::Connect(ConnectRequest {
            delay: Duration::ZERO,
            timeout: self.config.clean_reconnect_delay,
            kind: AttemptKind::FastReconnect,
        })
    }

    fn lost_uncleanly(&mut self, reason: &str) -> Directive {
        metrics::record_connection_lost(&self.server, false);
        self.result_down(reason);
        self.reporter.report(
            &status_line(&self.server, ConnectionEvent::Lost),
            Severity::Warning,
        );
        self.retry()
    }

    /// Schedule a slow reconnect and grow the backoff.
    fn retry(&mut self) -> Directive {
        self.phase = Phase::Backoff;
        let delay = self.backoff.next_delay();
        tracing::debug!(
            server = %self.server,
            delay_ms = delay.as_millis() as u64,
            "Scheduling slow reconnect"
        );
        Directive::Connect(ConnectRequest {
            delay,
            timeout: self.config.connect_timeout,
            kind: AttemptKind::SlowReconnect,
        })
    }

    fn result_up(&mut self) {
        if self.last_verdict != Verdict::Up {
            self.last_verdict = Verdict::Up;
            self.coordinator.on_up(&self.server);
        }
    }

    fn result_down(&mut self, reason: &str) {
        if self.last_verdict != Verdict::Down {
            self.last_verdict = Verdict::Down;
            self.coordinator.on_down(&self.server, reason);
        }
    }
}

impl std::fmt::Debug for MonitorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorState")
            .field("server", &self.server)
            .field("active", &self.active)
            .field("phase", &self.phase)
            .field("current_delay", &self.backoff.current())
            .field("last_verdict", &self.last_verdict)
            .finish()
    }
}
