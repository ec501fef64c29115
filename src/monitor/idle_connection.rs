//! Idle connection monitor lifecycle.
//!
//! # Responsibilities
//! - Own the state machine for one server
//! - Run the connect / hold / reconnect loop as a single tokio task
//! - Make `stop()` take effect synchronously
//!
//! # Design Decisions
//! - One task per monitor: events for a server are handled strictly in order
//! - The state lock is only held by synchronous handler code, never across
//!   an await, so `stop()` never waits on I/O
//! - Every suspension point also waits on the cancellation channel

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::{KeepaliveSettings, MonitorConfig};
use crate::health::{Coordinator, Verdict};
use crate::monitor::error::ProbeError;
use crate::monitor::state::{
    ConnectRequest, ConnectionOutcome, Directive, KeepaliveOutcome, MonitorState, Phase,
};
use crate::monitor::transport::{CloseReason, TcpTransport, Transport};
use crate::monitor::ServerEndpoint;
use crate::observability::Reporter;

/// Keeps an idle TCP connection open to one server and reports whether it is
/// up or down.
///
/// `run()` must be called from within a tokio runtime. Dropping the monitor
/// stops it.
pub struct IdleConnectionMonitor<T: Transport = TcpTransport> {
    server: ServerEndpoint,
    config: MonitorConfig,
    transport: Arc<T>,
    coordinator: Arc<dyn Coordinator>,
    reporter: Arc<dyn Reporter>,
    running: Option<Running>,
}

struct Running {
    state: Arc<Mutex<MonitorState>>,
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl IdleConnectionMonitor<TcpTransport> {
    pub fn new(
        server: ServerEndpoint,
        config: MonitorConfig,
        coordinator: Arc<dyn Coordinator>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self::with_transport(server, config, TcpTransport, coordinator, reporter)
    }
}

impl<T: Transport> IdleConnectionMonitor<T> {
    pub fn with_transport(
        server: ServerEndpoint,
        config: MonitorConfig,
        transport: T,
        coordinator: Arc<dyn Coordinator>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            server,
            config,
            transport: Arc::new(transport),
            coordinator,
            reporter,
            running: None,
        }
    }

    pub fn server(&self) -> &ServerEndpoint {
        &self.server
    }

    /// Start monitoring. Does nothing if already running.
    pub fn run(&mut self) {
        if self.is_running() {
            tracing::debug!(server = %self.server, "Monitor already running");
            return;
        }

        let mut state = MonitorState::new(
            self.server.clone(),
            self.config.clone(),
            self.coordinator.clone(),
            self.reporter.clone(),
        );
        let first = state.start();
        let state = Arc::new(Mutex::new(state));
        let (cancel, cancelled) = watch::channel(false);

        let driver = Driver {
            server: self.server.clone(),
            transport: self.transport.clone(),
            keepalive: self.config.keepalive(),
            state: state.clone(),
            cancelled,
        };
        let task = tokio::spawn(driver.run(first));

        tracing::info!(
            server = %self.server,
            keepalive = self.config.keepalive_enabled,
            max_delay_secs = self.config.max_reconnect_delay.as_secs(),
            "Idle connection monitor running"
        );
        self.running = Some(Running { state, cancel, task });
    }

    /// Stop monitoring. Once this returns no verdict or report is produced
    /// for this run, pending timers and attempts are abandoned and the
    /// connection is released. Idempotent.
    pub fn stop(&mut self) {
        let Some(running) = &self.running else {
            return;
        };
        lock(&running.state).stop();
        let _ = running.cancel.send(true);
    }

    /// Stop and wait for the monitor task to finish.
    pub async fn shutdown(&mut self) {
        self.stop();
        if let Some(running) = self.running.take() {
            if let Err(e) = running.task.await {
                tracing::error!(server = %self.server, error = %e, "Monitor task failed");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| lock(&running.state).is_active())
    }

    /// Last verdict sent to the coordinator during the current run.
    pub fn verdict(&self) -> Verdict {
        self.running
            .as_ref()
            .map_or(Verdict::Unknown, |running| lock(&running.state).last_verdict())
    }

    pub fn phase(&self) -> Phase {
        self.running
            .as_ref()
            .map_or(Phase::Stopped, |running| lock(&running.state).phase())
    }

    /// Delay the next slow reconnect would wait.
    pub fn current_delay(&self) -> Duration {
        self.running.as_ref().map_or(self.config.initial_reconnect_delay, |running| {
            lock(&running.state).current_delay()
        })
    }
}

impl<T: Transport> Drop for IdleConnectionMonitor<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock(state: &Mutex<MonitorState>) -> MutexGuard<'_, MonitorState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn dispatch(state: &Mutex<MonitorState>, outcome: ConnectionOutcome) -> Directive {
    lock(state).handle(outcome)
}

fn timer_fired(state: &Mutex<MonitorState>) -> bool {
    lock(state).on_timer_fired()
}

/// The task side of a running monitor.
struct Driver<T: Transport> {
    server: ServerEndpoint,
    transport: Arc<T>,
    keepalive: Option<KeepaliveSettings>,
    state: Arc<Mutex<MonitorState>>,
    cancelled: watch::Receiver<bool>,
}

impl<T: Transport> Driver<T> {
    async fn run(self, first: ConnectRequest) {
        let Driver {
            server,
            transport,
            keepalive,
            state,
            mut cancelled,
        } = self;
        let mut request = first;

        loop {
            if !request.delay.is_zero() {
                tokio::select! {
                    _ = time::sleep(request.delay) => {}
                    _ = cancelled.changed() => break,
                }
                if !timer_fired(&state) {
                    break;
                }
            }

            tracing::debug!(
                server = %server,
                attempt = ?request.kind,
                timeout_ms = request.timeout.as_millis() as u64,
                "Connecting"
            );
            let result = tokio::select! {
                result = connect_once(&*transport, &server, keepalive.as_ref(), request.timeout) => result,
                _ = cancelled.changed() => break,
            };

            let mut connection = match result {
                Ok((connection, applied)) => {
                    match dispatch(&state, ConnectionOutcome::ConnectionEstablished { keepalive: applied }) {
                        Directive::Hold => connection,
                        Directive::Connect(next) => {
                            request = next;
                            continue;
                        }
                        Directive::Halt => break,
                    }
                }
                Err(e) => match dispatch(&state, ConnectionOutcome::ConnectFailed(e.to_string())) {
                    Directive::Connect(next) => {
                        request = next;
                        continue;
                    }
                    Directive::Hold | Directive::Halt => break,
                },
            };

            let close = tokio::select! {
                close = transport.closed(&mut connection) => close,
                _ = cancelled.changed() => break,
            };
            drop(connection);

            let outcome = match close {
                CloseReason::Clean => ConnectionOutcome::ConnectionLost {
                    reason: "Connection was closed cleanly.".to_string(),
                    clean: true,
                },
                CloseReason::Unclean(e) => ConnectionOutcome::ConnectionLost {
                    reason: e.to_string(),
                    clean: false,
                },
            };
            match dispatch(&state, outcome) {
                Directive::Connect(next) => request = next,
                Directive::Hold | Directive::Halt => break,
            }
        }

        tracing::debug!(server = %server, "Idle connection monitor task exited");
    }
}

/// One connect attempt bounded by `timeout`, with keepalive applied on
/// success.
async fn connect_once<T: Transport>(
    transport: &T,
    server: &ServerEndpoint,
    keepalive: Option<&KeepaliveSettings>,
    timeout: Duration,
) -> Result<(T::Connection, KeepaliveOutcome), ProbeError> {
    let connection = time::timeout(timeout, transport.connect(server))
        .await
        .map_err(|_| ProbeError::ConnectTimeout(timeout))??;

    let keepalive = match keepalive {
        None => KeepaliveOutcome::Disabled,
        Some(settings) => match transport.apply_keepalive(&connection, settings) {
            Ok(()) => KeepaliveOutcome::Applied,
            Err(e) => KeepaliveOutcome::Failed(e.to_string()),
        },
    };
    Ok((connection, keepalive))
}
