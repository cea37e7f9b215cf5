//! Tests for the audit trail.

use super::*;
use std::collections::BTreeMap;

fn quiet(config: AuditConfig) -> AuditLogger {
    AuditLogger::new(AuditConfig { emit_tracing: false, ..config })
}

fn redacted(entities: &[(&str, usize)]) -> AuditKind {
    let by_category: BTreeMap<String, usize> =
        entities.iter().map(|(c, n)| (c.to_string(), *n)).collect();
    AuditKind::Redacted {
        secrets: 0,
        links: 0,
        entities: by_category.values().sum(),
        by_category,
    }
}

#[test]
fn test_request_ids_are_random_hex() {
    let a = RequestId::generate();
    let b = RequestId::generate();
    assert_eq!(a.as_str().len(), 16);
    assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a, b);
}

#[test]
fn test_severity_follows_kind() {
    assert_eq!(redacted(&[]).severity(), AuditSeverity::Info);
    assert_eq!(
        AuditKind::Restored { restored: 2, unused: 1, unknown: 0 }.severity(),
        AuditSeverity::Info
    );
    assert_eq!(
        AuditKind::Restored { restored: 1, unused: 0, unknown: 1 }.severity(),
        AuditSeverity::Warning
    );
    assert_eq!(AuditKind::Blocked { reason: BlockReason::Vault }.severity(), AuditSeverity::Error);
    assert!(AuditSeverity::Error > AuditSeverity::Warning);
}

#[test]
fn test_record_serializes_flat() {
    let record = AuditRecord::new(
        RequestId::generate(),
        AuditKind::Blocked { reason: BlockReason::VaultScheme },
    );
    let json: serde_json::Value = serde_json::to_value(&record).unwrap();
    assert_eq!(json["stage"], "blocked");
    assert_eq!(json["reason"], "vault_scheme");
    assert_eq!(json["severity"], "Error");
    assert_eq!(json["request_id"], record.request_id.as_str());
}

#[tokio::test]
async fn test_for_request_groups_one_call() {
    let logger = quiet(AuditConfig::default());
    let first = RequestId::generate();
    let second = RequestId::generate();

    logger.record(AuditRecord::new(first.clone(), redacted(&[("PERSON", 2)]))).await;
    logger.record(AuditRecord::new(second.clone(), redacted(&[]))).await;
    logger
        .record(AuditRecord::new(first.clone(), AuditKind::Restored { restored: 2, unused: 0, unknown: 0 }))
        .await;

    let stages: Vec<&str> = logger
        .for_request(&first)
        .await
        .iter()
        .map(|r| r.kind.stage())
        .collect();
    assert_eq!(stages, vec!["redacted", "restored"]);
    assert_eq!(logger.for_request(&second).await.len(), 1);
}

#[tokio::test]
async fn test_min_severity_and_bound() {
    let logger = quiet(AuditConfig { min_severity: AuditSeverity::Warning, max_events: 2, ..Default::default() });
    let request = RequestId::generate();

    logger.record(AuditRecord::new(request.clone(), redacted(&[]))).await;
    assert_eq!(logger.len().await, 0);

    for unknown in 1..=3 {
        logger
            .record(AuditRecord::new(request.clone(), AuditKind::Restored { restored: 0, unused: 0, unknown }))
            .await;
    }
    let records = logger.records().await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].kind, AuditKind::Restored { restored: 0, unused: 0, unknown: 2 });
}

#[tokio::test]
async fn test_export_holds_counts_per_category() {
    let logger = quiet(AuditConfig::default());
    logger
        .record(AuditRecord::new(RequestId::generate(), redacted(&[("EMAIL_ADDRESS", 1), ("PERSON", 3)])))
        .await;

    let exported: serde_json::Value = serde_json::from_str(&logger.export_json().await.unwrap()).unwrap();
    assert_eq!(exported[0]["stage"], "redacted");
    assert_eq!(exported[0]["entities"], 4);
    assert_eq!(exported[0]["by_category"]["PERSON"], 3);
}

#[tokio::test]
async fn test_disabled_logger_records_nothing() {
    let logger = quiet(AuditConfig { enabled: false, ..Default::default() });
    logger.record(AuditRecord::new(RequestId::generate(), AuditKind::VaultReadFailed)).await;
    assert_eq!(logger.len().await, 0);
}
