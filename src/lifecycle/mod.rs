//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Register servers → Start monitors
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop monitors (no more verdicts) → Await tasks → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then coordinator, then monitors
//! - Stopping a monitor is synchronous; awaiting its task only frees resources

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::MonitorFleet;
