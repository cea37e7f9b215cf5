//! Gateway configuration.
//!
//! Defaults, optionally overlaid by a TOML file named in `GHOST_GATE_CONFIG`,
//! then by individual environment variables.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::audit::AuditConfig;
use crate::detection::categories;
use crate::redaction::{Marker, RedactorConfig, TokenScheme};
use crate::telemetry::LogConfig;

pub const ENV_CONFIG_FILE: &str = "GHOST_GATE_CONFIG";
pub const ENV_TOKEN_SCHEME: &str = "GHOST_GATE_TOKEN_SCHEME";
pub const ENV_LOCALE: &str = "GHOST_GATE_LOCALE";
pub const ENV_CATEGORIES: &str = "GHOST_GATE_CATEGORIES";
pub const ENV_VAULT_TTL_SECS: &str = "GHOST_GATE_VAULT_TTL_SECS";
pub const ENV_UPSTREAM_TIMEOUT_SECS: &str = "GHOST_GATE_UPSTREAM_TIMEOUT_SECS";
pub const ENV_LOG_LEVEL: &str = "GHOST_GATE_LOG_LEVEL";
pub const ENV_LOG_JSON: &str = "GHOST_GATE_LOG_JSON";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

/// Complete gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub token_scheme: TokenScheme,
    /// Categories requested from the entity detector.
    pub entity_categories: Vec<String>,
    pub locale: String,
    pub vault_ttl_secs: u64,
    pub upstream_timeout_secs: u64,
    /// Presentation of restored values.
    pub marker: Marker,
    /// Write every mapping to an in-process vault for later restoration.
    /// Requires the random token scheme.
    pub persist_to_vault: bool,
    pub log: LogConfig,
    pub audit: AuditConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            token_scheme: TokenScheme::Counter,
            entity_categories: categories::default_set(),
            locale: "en".to_string(),
            vault_ttl_secs: 600,
            upstream_timeout_secs: 30,
            marker: Marker::None,
            persist_to_vault: false,
            log: LogConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl GatewayConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: GatewayConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Overlay values from any lookup (the process environment in
    /// [`load`], a map in tests).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_TOKEN_SCHEME) {
            self.token_scheme = v.parse().map_err(|reason| invalid(ENV_TOKEN_SCHEME, reason))?;
        }
        if let Some(v) = lookup(ENV_LOCALE) {
            self.locale = v.trim().to_string();
        }
        if let Some(v) = lookup(ENV_CATEGORIES) {
            self.entity_categories = v
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
        }
        if let Some(v) = lookup(ENV_VAULT_TTL_SECS) {
            self.vault_ttl_secs = parse_secs(ENV_VAULT_TTL_SECS, &v)?;
        }
        if let Some(v) = lookup(ENV_UPSTREAM_TIMEOUT_SECS) {
            self.upstream_timeout_secs = parse_secs(ENV_UPSTREAM_TIMEOUT_SECS, &v)?;
        }
        if let Some(v) = lookup(ENV_LOG_LEVEL) {
            self.log.level = v.trim().to_string();
        }
        if let Some(v) = lookup(ENV_LOG_JSON) {
            self.log.json = matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vault_ttl_secs == 0 {
            return Err(invalid("vault_ttl_secs", "must be greater than zero".into()));
        }
        if self.upstream_timeout_secs == 0 {
            return Err(invalid("upstream_timeout_secs", "must be greater than zero".into()));
        }
        if self.locale.trim().is_empty() {
            return Err(invalid("locale", "must not be empty".into()));
        }
        if self.persist_to_vault && self.token_scheme != TokenScheme::Random {
            return Err(invalid(
                "persist_to_vault",
                "a shared vault needs token_scheme = \"random\"".into(),
            ));
        }
        if self.audit.enabled && self.audit.max_events == 0 {
            return Err(invalid("audit.max_events", "must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn vault_ttl(&self) -> Duration {
        Duration::from_secs(self.vault_ttl_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn redactor_config(&self) -> RedactorConfig {
        RedactorConfig {
            token_scheme: self.token_scheme,
            categories: self.entity_categories.iter().cloned().collect::<BTreeSet<_>>(),
            locale: self.locale.clone(),
        }
    }
}

fn invalid(field: &str, reason: String) -> ConfigError {
    ConfigError::Invalid { field: field.to_string(), reason }
}

fn parse_secs(field: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| invalid(field, format!("'{}' is not a number of seconds: {}", value, e)))
}

/// Load configuration from `GHOST_GATE_CONFIG` and the environment.
pub fn load() -> Result<GatewayConfig, ConfigError> {
    let mut config = match std::env::var(ENV_CONFIG_FILE) {
        Ok(path) if !path.trim().is_empty() => GatewayConfig::load_file(path.trim())?,
        _ => GatewayConfig::default(),
    };
    config.apply_overrides(|key| std::env::var(key).ok())?;
    Ok(config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
