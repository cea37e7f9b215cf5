//! Fail-closed redaction round trip.
//!
//! A [`Gateway`] redacts a prompt, hands only the redacted text to an
//! [`Upstream`], and restores original values in the answer. If redaction,
//! conversion or the vault write fails, the upstream is never called.

mod upstream;

pub use upstream::{SimulatedUpstream, Upstream, UpstreamError};

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::audit::{AuditKind, AuditLogger, AuditRecord, BlockReason, RequestId};
use crate::config::GatewayConfig;
use crate::detection::{DetectionError, EntityDetector};
use crate::document::{ConversionError, DocumentConverter};
use crate::redaction::{Protected, Redactor, RestoreReport, Restorer, TokenScheme};
use crate::telemetry::{log_privacy_event, PrivacyEvent};
use crate::vault::{recover_mapping, MemoryVault, Vault, VaultError};

/// Redaction passes tried when a freshly minted token is already live in
/// the vault.
const MAX_VAULT_ATTEMPTS: usize = 3;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Blocked: redaction failed: {0}")]
    Blocked(#[from] DetectionError),
    #[error("Blocked: document conversion failed: {0}")]
    ConversionBlocked(#[from] ConversionError),
    #[error("Blocked: a shared vault needs random-scheme placeholders")]
    CounterTokensWithVault,
    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),
    #[error("No vault is attached to this gateway")]
    VaultUnavailable,
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl GatewayError {
    /// True when the request never left the trust boundary.
    pub fn is_blocked(&self) -> bool {
        !matches!(self, GatewayError::Upstream(_))
    }
}

/// Result of one chat exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeOutcome {
    /// Key of this exchange in the audit trail and logs.
    pub request_id: RequestId,
    /// Upstream answer with original values restored.
    pub response: String,
    /// Exactly what the upstream received.
    pub sanitized_prompt: String,
    /// Number of mapping entries withheld from the upstream.
    pub secrets_hidden: usize,
    /// Placeholder-shaped tokens in the answer that the mapping lacks.
    pub unknown_placeholders: Vec<String>,
}

pub struct Gateway {
    redactor: Redactor,
    restorer: Restorer,
    vault: Option<Arc<dyn Vault>>,
    audit: Option<Arc<AuditLogger>>,
    upstream_timeout: Duration,
}

impl Gateway {
    pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(redactor: Redactor, restorer: Restorer) -> Self {
        Self {
            redactor,
            restorer,
            vault: None,
            audit: None,
            upstream_timeout: Self::DEFAULT_UPSTREAM_TIMEOUT,
        }
    }

    /// Build from configuration. Attaches a [`MemoryVault`] when
    /// `persist_to_vault` is set and an [`AuditLogger`] when auditing is
    /// enabled.
    pub fn from_config(config: &GatewayConfig, detector: Arc<dyn EntityDetector>) -> Self {
        let mut gateway = Self::new(
            Redactor::new(detector, config.redactor_config()),
            Restorer::new(config.marker),
        )
        .with_upstream_timeout(config.upstream_timeout());
        if config.persist_to_vault {
            gateway = gateway.with_vault(Arc::new(MemoryVault::with_ttl(config.vault_ttl())));
        }
        if config.audit.enabled {
            gateway = gateway.with_audit(Arc::new(AuditLogger::new(config.audit.clone())));
        }
        gateway
    }

    /// Write every mapping to `vault`. Requests are blocked with
    /// [`GatewayError::CounterTokensWithVault`] unless the redactor mints
    /// random-scheme placeholders.
    pub fn with_vault(mut self, vault: Arc<dyn Vault>) -> Self {
        self.vault = Some(vault);
        self
    }

    pub fn with_audit(mut self, audit: Arc<AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    pub fn audit(&self) -> Option<&Arc<AuditLogger>> {
        self.audit.as_ref()
    }

    /// Redact `prompt`, query `upstream` with the redacted text, restore the
    /// answer.
    pub async fn secure_chat<S: AsRef<str>>(
        &self,
        prompt: &str,
        custom_secrets: &[S],
        upstream: &dyn Upstream,
    ) -> Result<ExchangeOutcome, GatewayError> {
        let request = RequestId::generate();
        let protected = self.protect(&request, prompt, custom_secrets).await?;

        let answer = match tokio::time::timeout(self.upstream_timeout, upstream.complete(&protected.text)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => return Err(self.upstream_failed(&request, upstream, e).await),
            Err(_) => {
                let e = UpstreamError::Timeout(self.upstream_timeout);
                return Err(self.upstream_failed(&request, upstream, e).await);
            }
        };

        let report = self.restorer.restore_with_report(&answer, &protected.mapping);
        self.record_restoration(&request, &report).await;

        info!(
            request_id = %request,
            upstream = upstream.name(),
            secrets_hidden = protected.mapping.len(),
            restored = report.restored,
            "Gateway exchange complete"
        );

        Ok(ExchangeOutcome {
            request_id: request,
            response: report.text,
            sanitized_prompt: protected.text,
            secrets_hidden: protected.mapping.len(),
            unknown_placeholders: report.unknown_placeholders,
        })
    }

    /// Extract text from an uploaded document and redact it.
    pub async fn protect_document<S: AsRef<str>>(
        &self,
        converter: &dyn DocumentConverter,
        bytes: &[u8],
        custom_secrets: &[S],
    ) -> Result<Protected, GatewayError> {
        let request = RequestId::generate();
        let text = match converter.extract_text(bytes) {
            Ok(text) => text,
            Err(e) => {
                self.block(&request, BlockReason::Conversion).await;
                return Err(e.into());
            }
        };
        let protected = self.protect(&request, &text, custom_secrets).await?;
        debug!(request_id = %request, format = converter.format_hint(), "Document redacted");
        Ok(protected)
    }

    /// Restore `text` from placeholders held in the attached vault.
    ///
    /// Expired or unknown placeholders are left as they are and listed in
    /// the report.
    pub async fn restore_from_vault(&self, text: &str) -> Result<RestoreReport, GatewayError> {
        let vault = self.vault.as_ref().ok_or(GatewayError::VaultUnavailable)?;
        let request = RequestId::generate();
        let mapping = match recover_mapping(vault.as_ref(), text) {
            Ok(mapping) => mapping,
            Err(e) => {
                log_privacy_event(
                    PrivacyEvent::VaultFailure,
                    "Vault read failed",
                    &[("request_id", request.as_str())],
                );
                self.audit_record(&request, AuditKind::VaultReadFailed).await;
                return Err(e.into());
            }
        };
        let report = self.restorer.restore_with_report(text, &mapping);
        self.record_restoration(&request, &report).await;
        Ok(report)
    }

    async fn protect<S: AsRef<str>>(
        &self,
        request: &RequestId,
        text: &str,
        custom_secrets: &[S],
    ) -> Result<Protected, GatewayError> {
        if self.vault.is_some() && self.redactor.config().token_scheme == TokenScheme::Counter {
            self.block(request, BlockReason::VaultScheme).await;
            return Err(GatewayError::CounterTokensWithVault);
        }

        let mut attempt = 0;
        let protected = loop {
            attempt += 1;
            let protected = match self.redactor.protect(text, custom_secrets) {
                Ok(protected) => protected,
                Err(e) => {
                    self.block(request, BlockReason::Detection).await;
                    return Err(e.into());
                }
            };
            let Some(vault) = &self.vault else {
                break protected;
            };
            match vault.store_mapping(&protected.mapping) {
                Ok(()) => break protected,
                Err(VaultError::Occupied(_)) if attempt < MAX_VAULT_ATTEMPTS => {
                    debug!(request_id = %request, attempt, "Minted token already live in vault, redacting again");
                }
                Err(e) => {
                    self.block(request, BlockReason::Vault).await;
                    return Err(e.into());
                }
            }
        };

        let stats = &protected.stats;
        self.audit_record(
            request,
            AuditKind::Redacted {
                secrets: stats.secrets,
                links: stats.links,
                entities: stats.entities,
                by_category: stats.by_category.clone(),
            },
        )
        .await;
        Ok(protected)
    }

    async fn block(&self, request: &RequestId, reason: BlockReason) {
        let event = match reason {
            BlockReason::Detection => PrivacyEvent::RedactionBlocked,
            BlockReason::Conversion => PrivacyEvent::ConversionFailed,
            BlockReason::Vault | BlockReason::VaultScheme => PrivacyEvent::VaultFailure,
        };
        metrics::counter!("ghost_gate_blocked_total", "reason" => reason.as_str()).increment(1);
        log_privacy_event(
            event,
            "Request blocked before leaving the trust boundary",
            &[("reason", reason.as_str()), ("request_id", request.as_str())],
        );
        self.audit_record(request, AuditKind::Blocked { reason }).await;
    }

    async fn upstream_failed(&self, request: &RequestId, upstream: &dyn Upstream, error: UpstreamError) -> GatewayError {
        tracing::warn!(request_id = %request, upstream = upstream.name(), error = %error, "Upstream call failed");
        self.audit_record(
            request,
            AuditKind::UpstreamFailed {
                upstream: upstream.name().to_string(),
                timed_out: matches!(error, UpstreamError::Timeout(_)),
            },
        )
        .await;
        error.into()
    }

    async fn record_restoration(&self, request: &RequestId, report: &RestoreReport) {
        self.audit_record(
            request,
            AuditKind::Restored {
                restored: report.restored,
                unused: report.unused.len(),
                unknown: report.unknown_placeholders.len(),
            },
        )
        .await;
    }

    async fn audit_record(&self, request: &RequestId, kind: AuditKind) {
        if let Some(audit) = &self.audit {
            audit.record(AuditRecord::new(request.clone(), kind)).await;
        }
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("restorer", &self.restorer)
            .field("vault", &self.vault.is_some())
            .field("audit", &self.audit.is_some())
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
