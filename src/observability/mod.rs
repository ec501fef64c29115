//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Monitors and the health board produce:
//!     → report.rs (status lines to a Reporter sink)
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - The report sink is a trait; the daemon routes it into tracing
//! - Metrics are cheap and optional

pub mod logging;
pub mod metrics;
pub mod report;

pub use report::{Reporter, Severity, TracingReporter};
