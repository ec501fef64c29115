//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (durations > 0, retries >= 0, ports valid)
//! - Detect servers listed twice
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs before a config is handed to any monitor

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::{MonitorConfig, MonitorSettings, RawMonitorConfig};
use crate::config::ConfigError;

/// A single semantic configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("`{key}` must be a positive number of seconds, got {value}")]
    NonPositiveDuration { key: &'static str, value: i64 },

    #[error("`{key}` must not be negative, got {value}")]
    NegativeCount { key: &'static str, value: i64 },

    #[error("`initial-delay` ({initial}s) must not exceed `max-delay` ({max}s)")]
    InitialAboveMax { initial: i64, max: i64 },

    #[error("server #{index} has an empty host")]
    EmptyHost { index: usize },

    #[error("server {endpoint} has port 0")]
    ZeroPort { endpoint: String },

    #[error("server {endpoint} is listed more than once")]
    DuplicateServer { endpoint: String },

    #[error("server {endpoint}: {reason}")]
    ServerMonitor { endpoint: String, reason: String },
}

pub(crate) fn validate_monitor(raw: &RawMonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let durations = [
        (MonitorConfig::KEY_CLEAN_RECONNECT, raw.clean_reconnect),
        (MonitorConfig::KEY_MAX_DELAY, raw.max_delay),
        (MonitorConfig::KEY_INITIAL_DELAY, raw.initial_delay),
        (MonitorConfig::KEY_CONNECT_TIMEOUT, raw.connect_timeout),
        (MonitorConfig::KEY_KEEPALIVE_IDLE, raw.idle),
        (MonitorConfig::KEY_KEEPALIVE_INTERVAL, raw.interval),
    ];
    for (key, value) in durations {
        if value <= 0 {
            errors.push(ValidationError::NonPositiveDuration { key, value });
        }
    }

    if raw.retries < 0 {
        errors.push(ValidationError::NegativeCount {
            key: MonitorConfig::KEY_KEEPALIVE_RETRIES,
            value: raw.retries,
        });
    }

    if raw.initial_delay > 0 && raw.max_delay > 0 && raw.initial_delay > raw.max_delay {
        errors.push(ValidationError::InitialAboveMax {
            initial: raw.initial_delay,
            max: raw.max_delay,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the daemon settings, including every server's resolved monitor
/// config.
pub fn validate_settings(settings: &MonitorSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, server) in settings.servers.iter().enumerate() {
        let endpoint = server.endpoint().to_string();

        if server.host.trim().is_empty() {
            errors.push(ValidationError::EmptyHost { index });
        }
        if server.port == 0 {
            errors.push(ValidationError::ZeroPort {
                endpoint: endpoint.clone(),
            });
        }
        if !seen.insert(endpoint.clone()) {
            errors.push(ValidationError::DuplicateServer {
                endpoint: endpoint.clone(),
            });
        }

        let table = server.monitor_table(&settings.monitor);
        match MonitorConfig::from_provider(&table) {
            Ok(_) => {}
            Err(ConfigError::Validation(inner)) => {
                errors.extend(inner.into_iter().map(|e| ValidationError::ServerMonitor {
                    endpoint: endpoint.clone(),
                    reason: e.to_string(),
                }));
            }
            Err(e) => errors.push(ValidationError::ServerMonitor {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            }),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
