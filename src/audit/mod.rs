//! Redaction audit trail.
//!
//! Bounded in-memory record of what each gateway call did, keyed by
//! [`RequestId`]. The logger is injected where it is needed; there is no
//! global instance.

mod audit_types;

pub use audit_types::{AuditConfig, AuditKind, AuditRecord, AuditSeverity, BlockReason, RequestId};

use std::collections::VecDeque;
use tokio::sync::RwLock;

pub struct AuditLogger {
    config: AuditConfig,
    records: RwLock<VecDeque<AuditRecord>>,
}

impl AuditLogger {
    pub fn new(config: AuditConfig) -> Self {
        Self { config, records: RwLock::new(VecDeque::new()) }
    }

    pub async fn record(&self, record: AuditRecord) {
        if !self.config.enabled || record.severity < self.config.min_severity {
            return;
        }
        if self.config.emit_tracing {
            tracing::info!(
                target: "ghost_gate::audit",
                request_id = %record.request_id,
                stage = record.kind.stage(),
                severity = ?record.severity,
                "Audit record"
            );
        }
        let mut records = self.records.write().await;
        records.push_back(record);
        while records.len() > self.config.max_events {
            records.pop_front();
        }
    }

    /// Every retained record, oldest first.
    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.read().await.iter().cloned().collect()
    }

    /// Records written for one gateway call, oldest first.
    pub async fn for_request(&self, request_id: &RequestId) -> Vec<AuditRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| &r.request_id == request_id)
            .cloned()
            .collect()
    }

    pub async fn export_json(&self) -> Result<String, serde_json::Error> {
        let records = self.records.read().await;
        serde_json::to_string_pretty(&*records)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new(AuditConfig::default())
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
