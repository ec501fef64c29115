//! Health verdict subsystem.
//!
//! # Data Flow
//! ```text
//! Idle connection monitor (monitor/):
//!     Connection outcome
//!     → state machine decides Up/Down
//!     → Coordinator::on_up / on_down (state.rs)
//!
//! Health board (board.rs):
//!     Verdict received
//!     → per-server atomic state updated
//!     → transition logged, gauge exported
//! ```
//!
//! # Design Decisions
//! - Coordinator is a trait so the monitor does not depend on pool logic
//! - Health state is per-server, not per-pool

pub mod board;
pub mod state;

pub use board::HealthBoard;
pub use state::{Coordinator, Verdict};
