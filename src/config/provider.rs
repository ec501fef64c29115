//! Typed configuration lookup.
//!
//! Monitors read their settings through [`ConfigProvider`], a small key/value
//! capability with typed accessors and defaults. Values may be native TOML
//! types or strings (`"3"`, `"yes"`), which are parsed.

use std::collections::HashMap;

use crate::config::ConfigError;

/// A raw configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Int(i64),
    Bool(bool),
    Str(String),
}

/// The type a caller expects a key to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Bool,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Int => write!(f, "an integer"),
            ValueKind::Bool => write!(f, "a boolean"),
        }
    }
}

/// Key/value configuration source.
pub trait ConfigProvider {
    /// Look up a raw value. `None` means the key is absent.
    fn lookup(&self, key: &str) -> Option<ConfigValue>;

    /// Typed lookup with a default for absent keys.
    fn get(&self, key: &str, kind: ValueKind, default: ConfigValue) -> Result<ConfigValue, ConfigError> {
        let Some(value) = self.lookup(key) else {
            return Ok(default);
        };
        coerce(key, kind, value)
    }

    fn get_int(&self, key: &str, default: i64) -> Result<i64, ConfigError> {
        match self.get(key, ValueKind::Int, ConfigValue::Int(default))? {
            ConfigValue::Int(v) => Ok(v),
            _ => Err(invalid(key, ValueKind::Int)),
        }
    }

    fn get_bool(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key, ValueKind::Bool, ConfigValue::Bool(default))? {
            ConfigValue::Bool(v) => Ok(v),
            _ => Err(invalid(key, ValueKind::Bool)),
        }
    }
}

fn invalid(key: &str, expected: ValueKind) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        expected,
    }
}

fn coerce(key: &str, kind: ValueKind, value: ConfigValue) -> Result<ConfigValue, ConfigError> {
    match (kind, value) {
        (ValueKind::Int, ConfigValue::Int(v)) => Ok(ConfigValue::Int(v)),
        (ValueKind::Int, ConfigValue::Str(s)) => s
            .trim()
            .parse()
            .map(ConfigValue::Int)
            .map_err(|_| invalid(key, kind)),
        (ValueKind::Bool, ConfigValue::Bool(v)) => Ok(ConfigValue::Bool(v)),
        (ValueKind::Bool, ConfigValue::Int(v)) => Ok(ConfigValue::Bool(v != 0)),
        (ValueKind::Bool, ConfigValue::Str(s)) => parse_bool(&s)
            .map(ConfigValue::Bool)
            .ok_or_else(|| invalid(key, kind)),
        _ => Err(invalid(key, kind)),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

impl ConfigProvider for toml::Table {
    fn lookup(&self, key: &str) -> Option<ConfigValue> {
        match self.get(key)? {
            toml::Value::Integer(v) => Some(ConfigValue::Int(*v)),
            toml::Value::Boolean(v) => Some(ConfigValue::Bool(*v)),
            toml::Value::String(v) => Some(ConfigValue::Str(v.clone())),
            other => Some(ConfigValue::Str(other.to_string())),
        }
    }
}

impl ConfigProvider for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<ConfigValue> {
        self.get(key).map(|v| ConfigValue::Str(v.clone()))
    }
}
