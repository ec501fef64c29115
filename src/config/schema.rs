//! Configuration schema definitions.
//!
//! The daemon reads one TOML file shaped like [`MonitorSettings`]. Monitor
//! tuning keys stay as a raw [`toml::Table`] and are resolved through the
//! [`ConfigProvider`](crate::config::provider::ConfigProvider) so that the
//! same keys work whatever the source.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::provider::ConfigProvider;
use crate::config::ConfigError;
use crate::monitor::ServerEndpoint;

/// Root configuration for the idle connection monitor daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorSettings {
    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Monitor keys applied to every server (e.g. `max-delay = 300`).
    pub monitor: toml::Table,

    /// Servers to monitor.
    pub servers: Vec<ServerConfig>,
}

/// A monitored server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host name or IP address.
    pub host: String,

    /// TCP port.
    pub port: u16,

    /// Per-server monitor keys, layered over the global `[monitor]` table.
    #[serde(default)]
    pub monitor: toml::Table,
}

impl ServerConfig {
    pub fn endpoint(&self) -> ServerEndpoint {
        ServerEndpoint::new(self.host.clone(), self.port)
    }

    /// Global monitor keys with this server's overrides applied on top.
    pub fn monitor_table(&self, defaults: &toml::Table) -> toml::Table {
        let mut merged = defaults.clone();
        merged.extend(self.monitor.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Tuning for a single idle connection monitor.
///
/// Read once when the monitor is constructed and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Deadline for the immediate reconnect that follows a clean close.
    pub clean_reconnect_delay: Duration,

    /// Upper bound for the slow reconnect backoff.
    pub max_reconnect_delay: Duration,

    /// First slow reconnect delay after a success.
    pub initial_reconnect_delay: Duration,

    /// Deadline for an ordinary connect attempt.
    pub connect_timeout: Duration,

    pub keepalive_enabled: bool,
    pub keepalive_retries: u32,
    pub keepalive_idle: Duration,
    pub keepalive_interval: Duration,
}

impl MonitorConfig {
    pub const KEY_CLEAN_RECONNECT: &'static str = "timeout-clean-reconnect";
    pub const KEY_MAX_DELAY: &'static str = "max-delay";
    pub const KEY_INITIAL_DELAY: &'static str = "initial-delay";
    pub const KEY_CONNECT_TIMEOUT: &'static str = "timeout-connect";
    pub const KEY_KEEPALIVE: &'static str = "keepalive";
    pub const KEY_KEEPALIVE_RETRIES: &'static str = "keepalive-retries";
    pub const KEY_KEEPALIVE_IDLE: &'static str = "keepalive-idle";
    pub const KEY_KEEPALIVE_INTERVAL: &'static str = "keepalive-interval";

    /// Build a config from a provider, falling back to the defaults for any
    /// missing key, then validate it.
    pub fn from_provider(provider: &dyn ConfigProvider) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let secs = |key: &str, default: Duration| -> Result<i64, ConfigError> {
            provider.get_int(key, default.as_secs() as i64)
        };

        let clean_reconnect = secs(Self::KEY_CLEAN_RECONNECT, defaults.clean_reconnect_delay)?;
        let max_delay = secs(Self::KEY_MAX_DELAY, defaults.max_reconnect_delay)?;
        let initial_delay = secs(Self::KEY_INITIAL_DELAY, defaults.initial_reconnect_delay)?;
        let connect_timeout = secs(Self::KEY_CONNECT_TIMEOUT, defaults.connect_timeout)?;
        let keepalive = provider.get_bool(Self::KEY_KEEPALIVE, defaults.keepalive_enabled)?;
        let retries = provider.get_int(
            Self::KEY_KEEPALIVE_RETRIES,
            i64::from(defaults.keepalive_retries),
        )?;
        let idle = secs(Self::KEY_KEEPALIVE_IDLE, defaults.keepalive_idle)?;
        let interval = secs(Self::KEY_KEEPALIVE_INTERVAL, defaults.keepalive_interval)?;

        let raw = RawMonitorConfig {
            clean_reconnect,
            max_delay,
            initial_delay,
            connect_timeout,
            keepalive,
            retries,
            idle,
            interval,
        };
        crate::config::validation::validate_monitor(&raw).map_err(ConfigError::Validation)?;

        Ok(raw.into_config())
    }

    /// Keepalive settings to apply on establishment, if enabled.
    pub fn keepalive(&self) -> Option<KeepaliveSettings> {
        self.keepalive_enabled.then(|| KeepaliveSettings {
            idle: self.keepalive_idle,
            interval: self.keepalive_interval,
            retries: self.keepalive_retries,
        })
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            clean_reconnect_delay: Duration::from_secs(3),
            max_reconnect_delay: Duration::from_secs(300),
            initial_reconnect_delay: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(30),
            keepalive_enabled: true,
            keepalive_retries: 3,
            keepalive_idle: Duration::from_secs(10),
            keepalive_interval: Duration::from_secs(30),
        }
    }
}

/// TCP keepalive parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepaliveSettings {
    /// Idle time before the first probe.
    pub idle: Duration,
    /// Time between probes.
    pub interval: Duration,
    /// Unanswered probes before the connection is dropped.
    pub retries: u32,
}

/// Integer values as read from a provider, before validation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawMonitorConfig {
    pub clean_reconnect: i64,
    pub max_delay: i64,
    pub initial_delay: i64,
    pub connect_timeout: i64,
    pub keepalive: bool,
    pub retries: i64,
    pub idle: i64,
    pub interval: i64,
}

impl RawMonitorConfig {
    /// Only valid after `validate_monitor` accepted the values.
    fn into_config(self) -> MonitorConfig {
        let secs = |v: i64| Duration::from_secs(v.max(0) as u64);
        MonitorConfig {
            clean_reconnect_delay: secs(self.clean_reconnect),
            max_reconnect_delay: secs(self.max_delay),
            initial_reconnect_delay: secs(self.initial_delay),
            connect_timeout: secs(self.connect_timeout),
            keepalive_enabled: self.keepalive,
            keepalive_retries: u32::try_from(self.retries).unwrap_or(u32::MAX),
            keepalive_idle: secs(self.idle),
            keepalive_interval: secs(self.interval),
        }
    }
}
