//! Server verdicts and the coordinator boundary.
//!
//! # States
//! - Unknown: no connection outcome seen yet
//! - Up: the idle connection is established
//! - Down: a connect failed or the connection was lost uncleanly
//!
//! # Design Decisions
//! - Verdicts are level signals; a coordinator may receive the same one twice
//! - Monitors only emit a verdict when it differs from the last one they sent
//! - Coordinators receive verdicts by value and never see monitor internals

use crate::monitor::ServerEndpoint;

/// Binary liveness verdict (plus the initial unknown).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    #[default]
    Unknown = 0,
    Up = 1,
    Down = 2,
}

impl From<u8> for Verdict {
    fn from(val: u8) -> Self {
        match val {
            1 => Verdict::Up,
            2 => Verdict::Down,
            _ => Verdict::Unknown,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Unknown => write!(f, "unknown"),
            Verdict::Up => write!(f, "up"),
            Verdict::Down => write!(f, "down"),
        }
    }
}

/// Receiver of verdicts, typically the component deciding pool membership.
///
/// Called from inside a monitor's event handler while it holds its own state
/// lock, so implementations must not call back into the monitor.
pub trait Coordinator: Send + Sync {
    fn on_up(&self, server: &ServerEndpoint);
    fn on_down(&self, server: &ServerEndpoint, reason: &str);
}
