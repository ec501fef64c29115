//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Connection failure observed by a monitor:
//!     → backoff.rs (take current delay, grow for next time)
//!     → monitor schedules the slow reconnect
//!
//! Connection established:
//!     → backoff.rs reset to the minimum delay
//! ```
//!
//! # Design Decisions
//! - Backoff is a plain value owned by each monitor, no shared state
//! - Delay is capped, never unbounded
//! - No jitter: delays must stay non-decreasing between resets

pub mod backoff;

pub use backoff::BackoffPolicy;
