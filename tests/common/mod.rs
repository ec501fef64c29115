//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use idle_monitor::{Coordinator, MonitorConfig, Reporter, ServerEndpoint, Severity};
use socket2::SockRef;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Monitor config with millisecond timings so tests run quickly.
pub fn fast_config() -> MonitorConfig {
    MonitorConfig {
        clean_reconnect_delay: Duration::from_millis(100),
        max_reconnect_delay: Duration::from_millis(400),
        initial_reconnect_delay: Duration::from_millis(50),
        connect_timeout: Duration::from_secs(1),
        ..MonitorConfig::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Up,
    Down(String),
    Report(String, Severity),
}

/// Records verdicts and reports in arrival order.
#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn verdicts(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| !matches!(e, Event::Report(..)))
            .collect()
    }

    pub fn reports(&self) -> Vec<(String, Severity)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Report(message, severity) => Some((message, severity)),
                _ => None,
            })
            .collect()
    }

    pub fn count_reports(&self, suffix: &str) -> usize {
        self.reports()
            .iter()
            .filter(|(message, _)| message.ends_with(suffix))
            .count()
    }
}

impl Coordinator for Recorder {
    fn on_up(&self, _server: &ServerEndpoint) {
        self.events.lock().unwrap().push(Event::Up);
    }

    fn on_down(&self, _server: &ServerEndpoint, reason: &str) {
        self.events.lock().unwrap().push(Event::Down(reason.to_string()));
    }
}

impl Reporter for Recorder {
    fn report(&self, message: &str, severity: Severity) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Report(message.to_string(), severity));
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// A port nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A backend that accepts connections and holds them open, idle.
pub struct HoldingBackend {
    pub addr: SocketAddr,
    held: Arc<Mutex<Vec<TcpStream>>>,
    accepted: Arc<AtomicUsize>,
    accept_task: JoinHandle<()>,
}

impl HoldingBackend {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let held = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::new(AtomicUsize::new(0));

        let accept_task = spawn_accept_loop(listener, held.clone(), accepted.clone());

        Self {
            addr,
            held,
            accepted,
            accept_task,
        }
    }

    pub fn endpoint(&self) -> ServerEndpoint {
        ServerEndpoint::from(self.addr)
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn held(&self) -> usize {
        self.held.lock().unwrap().len()
    }

    /// Take ownership of the oldest held connection.
    pub fn take_held(&self) -> Option<TcpStream> {
        let mut held = self.held.lock().unwrap();
        (!held.is_empty()).then(|| held.remove(0))
    }

    /// Close every held connection with a FIN.
    pub fn close_all_cleanly(&self) {
        self.held.lock().unwrap().clear();
    }

    /// Abort every held connection with a RST.
    pub fn reset_all(&self) {
        for stream in self.held.lock().unwrap().drain(..) {
            SockRef::from(&stream).set_linger(Some(Duration::ZERO)).unwrap();
        }
    }

    /// Stop listening; new connection attempts are refused.
    pub async fn stop_listening(&self) {
        self.accept_task.abort();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

impl Drop for HoldingBackend {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

fn spawn_accept_loop(
    listener: TcpListener,
    held: Arc<Mutex<Vec<TcpStream>>>,
    accepted: Arc<AtomicUsize>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            held.lock().unwrap().push(stream);
            accepted.fetch_add(1, Ordering::SeqCst);
        }
    })
}

/// Run `f` with a deadline so a hung test fails instead of stalling.
pub async fn within<F: Future>(timeout: Duration, f: F) -> F::Output {
    tokio::time::timeout(timeout, f)
        .await
        .expect("test step timed out")
}
