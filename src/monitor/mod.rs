//! Idle connection monitoring.
//!
//! # Data Flow
//! ```text
//! IdleConnectionMonitor::run()
//!     → idle_connection.rs spawns one driver task
//!     → transport.rs connects (keepalive applied on success)
//!     → state.rs turns the outcome into a verdict + directive
//!     → driver sleeps / holds the connection / reconnects
//!
//! IdleConnectionMonitor::stop()
//!     → state.rs deactivated under the lock (no more side effects)
//!     → driver cancelled at its next suspension point
//! ```
//!
//! # Design Decisions
//! - The connection carries no traffic; only how it ends matters
//! - Clean close → fast reconnect without a verdict change
//! - Failed connect / unclean close → Down, then exponential backoff

pub mod endpoint;
pub mod error;
pub mod idle_connection;
pub mod state;
pub mod transport;

pub use endpoint::ServerEndpoint;
pub use error::ProbeError;
pub use idle_connection::IdleConnectionMonitor;
pub use state::{
    AttemptKind, ConnectRequest, ConnectionOutcome, Directive, KeepaliveOutcome, MonitorState, Phase,
};
pub use transport::{CloseReason, TcpTransport, Transport};
