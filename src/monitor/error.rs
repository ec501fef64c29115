//! Probe failures.
//!
//! None of these are fatal: the monitor turns each one into a verdict and a
//! reconnect. The `Display` text is the reason handed to the coordinator.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    /// The handshake never completed (refused, unreachable, DNS).
    #[error("{0}")]
    Connect(#[source] std::io::Error),

    /// The handshake did not complete before the deadline.
    #[error("connection attempt timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// An established connection ended abnormally (reset, broken pipe).
    #[error("{0}")]
    ConnectionLost(#[source] std::io::Error),

    /// A keepalive socket option could not be applied.
    #[error("could not apply keepalive options: {0}")]
    Keepalive(#[source] std::io::Error),
}
