//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, every server's monitor keys resolved)
//!     → MonitorSettings (validated, immutable)
//!
//! Per monitor:
//!     [monitor] table + [servers.monitor] overrides
//!     → provider.rs (typed get_int / get_bool with defaults)
//!     → MonitorConfig (read once at construction)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a monitor never re-reads it
//! - All keys have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

use std::path::PathBuf;

use thiserror::Error;

pub mod loader;
pub mod provider;
pub mod schema;
pub mod validation;

pub use provider::{ConfigProvider, ConfigValue, ValueKind};
pub use schema::{KeepaliveSettings, MonitorConfig, MonitorSettings, ObservabilityConfig, ServerConfig};
pub use validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("`{key}` must be {expected}")]
    InvalidValue { key: String, expected: ValueKind },

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
