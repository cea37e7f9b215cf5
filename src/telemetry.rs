//! Logging setup and structured privacy events.
//!
//! Events carry categories, counts, and placeholder tokens only. Original
//! values never reach a log line.

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

/// Install the global `tracing` subscriber.
///
/// Returns `false` when a subscriber was already installed, which makes
/// repeated calls (tests, embedding hosts) harmless.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));
    let builder = fmt().with_env_filter(filter).with_target(true);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}

/// Privacy-relevant pipeline events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivacyEvent {
    /// Redaction failed and the text was held back.
    RedactionBlocked,
    /// Upstream response referenced placeholders the mapping lacks.
    MappingMismatch,
    /// Mapping entries the upstream response never echoed back.
    UnusedPlaceholders,
    /// Document text could not be extracted.
    ConversionFailed,
    /// Vault could not be read or written.
    VaultFailure,
}

impl PrivacyEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyEvent::RedactionBlocked => "redaction_blocked",
            PrivacyEvent::MappingMismatch => "mapping_mismatch",
            PrivacyEvent::UnusedPlaceholders => "unused_placeholders",
            PrivacyEvent::ConversionFailed => "conversion_failed",
            PrivacyEvent::VaultFailure => "vault_failure",
        }
    }

    fn is_failure(&self) -> bool {
        matches!(
            self,
            PrivacyEvent::RedactionBlocked
                | PrivacyEvent::MappingMismatch
                | PrivacyEvent::ConversionFailed
                | PrivacyEvent::VaultFailure
        )
    }
}

/// Emit a privacy event with key/value context.
pub fn log_privacy_event(event: PrivacyEvent, message: &str, fields: &[(&str, &str)]) {
    let context = fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ");
    if event.is_failure() {
        tracing::warn!(target: "ghost_gate::privacy", event = event.as_str(), %context, "{}", message);
    } else {
        tracing::debug!(target: "ghost_gate::privacy", event = event.as_str(), %context, "{}", message);
    }
}
