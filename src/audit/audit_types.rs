//! Records kept by the redaction audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bytes of randomness behind a request id (16 hex chars).
const REQUEST_ID_BYTES: usize = 8;

fn random_hex(len: usize) -> String {
    use rand::RngCore;
    let mut bytes = vec![0u8; len];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Correlates every record written for one gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(random_hex(REQUEST_ID_BYTES))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuditSeverity {
    Info,
    Warning,
    Error,
}

/// Why a request was held back inside the trust boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    Detection,
    Conversion,
    Vault,
    /// A vault was attached to a gateway minting counter placeholders.
    VaultScheme,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::Detection => "detection",
            BlockReason::Conversion => "conversion",
            BlockReason::Vault => "vault",
            BlockReason::VaultScheme => "vault_scheme",
        }
    }
}

/// What happened. Holds tags and counts only; error text is left out
/// because detector messages may quote the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum AuditKind {
    Redacted {
        secrets: usize,
        links: usize,
        entities: usize,
        by_category: BTreeMap<String, usize>,
    },
    Restored {
        restored: usize,
        unused: usize,
        unknown: usize,
    },
    Blocked {
        reason: BlockReason,
    },
    UpstreamFailed {
        upstream: String,
        timed_out: bool,
    },
    VaultReadFailed,
}

impl AuditKind {
    pub fn severity(&self) -> AuditSeverity {
        match self {
            AuditKind::Redacted { .. } => AuditSeverity::Info,
            AuditKind::Restored { unknown: 0, .. } => AuditSeverity::Info,
            AuditKind::Restored { .. } => AuditSeverity::Warning,
            AuditKind::Blocked { .. } | AuditKind::UpstreamFailed { .. } | AuditKind::VaultReadFailed => {
                AuditSeverity::Error
            }
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            AuditKind::Redacted { .. } => "redacted",
            AuditKind::Restored { .. } => "restored",
            AuditKind::Blocked { .. } => "blocked",
            AuditKind::UpstreamFailed { .. } => "upstream_failed",
            AuditKind::VaultReadFailed => "vault_read_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub request_id: RequestId,
    pub severity: AuditSeverity,
    #[serde(flatten)]
    pub kind: AuditKind,
}

impl AuditRecord {
    pub fn new(request_id: RequestId, kind: AuditKind) -> Self {
        Self {
            id: random_hex(16),
            timestamp: Utc::now(),
            request_id,
            severity: kind.severity(),
            kind,
        }
    }
}

/// Audit trail configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    /// Records below this severity are dropped.
    pub min_severity: AuditSeverity,
    /// Oldest records are evicted beyond this many.
    pub max_events: usize,
    /// Mirror each record to `tracing`.
    pub emit_tracing: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_severity: AuditSeverity::Info,
            max_events: 10000,
            emit_tracing: true,
        }
    }
}
