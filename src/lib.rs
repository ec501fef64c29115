//! Idle TCP connection health monitor.
//!
//! Keeps one long-lived idle TCP connection open to each monitored server and
//! infers liveness from how that connection behaves.

pub mod config;
pub mod health;
pub mod lifecycle;
pub mod monitor;
pub mod observability;
pub mod resilience;

pub use config::{MonitorConfig, MonitorSettings};
pub use health::{Coordinator, HealthBoard, Verdict};
pub use lifecycle::Shutdown;
pub use monitor::{IdleConnectionMonitor, ServerEndpoint};
pub use observability::{Reporter, Severity};
