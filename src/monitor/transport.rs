//! Transport used by the idle connection monitor.
//!
//! # Responsibilities
//! - Open one outbound TCP connection to the endpoint
//! - Tune keepalive on the established socket
//! - Wait for the idle connection to end and classify how it ended
//!
//! # Design Decisions
//! - EOF is a clean close, any read error is an unclean one
//! - Bytes sent by the peer are read and discarded
//! - Keepalive failures are returned, never panicked on

use std::future::Future;

use socket2::{SockRef, TcpKeepalive};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use crate::config::KeepaliveSettings;
use crate::monitor::error::ProbeError;
use crate::monitor::ServerEndpoint;

/// How an established connection ended.
#[derive(Debug)]
pub enum CloseReason {
    /// Orderly close by the peer or an intermediary.
    Clean,
    /// Reset, timeout or other error.
    Unclean(ProbeError),
}

/// Connection capability the monitor drives.
pub trait Transport: Send + Sync + 'static {
    type Connection: Send + 'static;

    /// Open a connection to `endpoint`.
    fn connect(
        &self,
        endpoint: &ServerEndpoint,
    ) -> impl Future<Output = Result<Self::Connection, ProbeError>> + Send;

    /// Enable and tune TCP keepalive on an established connection.
    fn apply_keepalive(
        &self,
        connection: &Self::Connection,
        settings: &KeepaliveSettings,
    ) -> Result<(), ProbeError>;

    /// Resolve once the connection has ended.
    fn closed(&self, connection: &mut Self::Connection) -> impl Future<Output = CloseReason> + Send;
}

/// Plain TCP over tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpTransport;

impl Transport for TcpTransport {
    type Connection = TcpStream;

    async fn connect(&self, endpoint: &ServerEndpoint) -> Result<TcpStream, ProbeError> {
        TcpStream::connect((endpoint.host.as_str(), endpoint.port))
            .await
            .map_err(ProbeError::Connect)
    }

    fn apply_keepalive(
        &self,
        connection: &TcpStream,
        settings: &KeepaliveSettings,
    ) -> Result<(), ProbeError> {
        apply_keepalive(connection, settings).map_err(ProbeError::Keepalive)
    }

    async fn closed(&self, connection: &mut TcpStream) -> CloseReason {
        let mut buf = [0u8; 512];
        loop {
            match connection.read(&mut buf).await {
                Ok(0) => return CloseReason::Clean,
                Ok(n) => tracing::trace!(bytes = n, "Discarding data on idle connection"),
                Err(e) => return CloseReason::Unclean(ProbeError::ConnectionLost(e)),
            }
        }
    }
}

/// Enable SO_KEEPALIVE and set idle time, probe interval and retry count.
pub fn apply_keepalive(stream: &TcpStream, settings: &KeepaliveSettings) -> std::io::Result<()> {
    let socket = SockRef::from(stream);

    let keepalive = TcpKeepalive::new().with_time(settings.idle);

    #[cfg(any(
        target_os = "linux",
        target_os = "android",
        target_os = "freebsd",
        target_os = "macos"
    ))]
    let keepalive = keepalive
        .with_interval(settings.interval)
        .with_retries(settings.retries);

    socket.set_tcp_keepalive(&keepalive)?;
    tracing::debug!(
        idle_secs = settings.idle.as_secs(),
        interval_secs = settings.interval.as_secs(),
        retries = settings.retries,
        "Applied TCP keepalive settings"
    );
    Ok(())
}
