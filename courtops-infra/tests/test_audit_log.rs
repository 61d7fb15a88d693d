use chrono::{TimeZone, Utc};
use courtops_infra::{AuditLog, AuditLogError};
use courtops_tools::{AuditEntry, AuditRecorder, AuditSink};
use serde_json::Map;
use std::sync::Arc;
use tempfile::tempdir;

fn entry(tool: &str, outcome: &str) -> AuditEntry {
    AuditEntry {
        id: format!("id-{}", tool),
        user_id: Some(1),
        tool: tool.to_string(),
        args_digest: "0123456789abcdef".to_string(),
        outcome_summary: outcome.to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
    }
}

#[test]
fn test_valid_chain_verification() {
    let dir = tempdir().unwrap();
    let log = AuditLog::open(dir.path().join("audit.jsonl")).unwrap();

    for i in 0..5 {
        log.log(&entry(&format!("tool_{}", i), "ok")).unwrap();
    }

    assert_eq!(log.verify_integrity().unwrap(), 5);
}

#[test]
fn test_tampered_entry_detection() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let log = AuditLog::open(&path).unwrap();
    for i in 0..3 {
        log.log(&entry(&format!("tool_{}", i), "ok")).unwrap();
    }

    let content = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, content.replace("tool_1", "tool_X")).unwrap();

    assert!(matches!(
        log.verify_integrity(),
        Err(AuditLogError::IntegrityViolation(_))
    ));
}

#[test]
fn test_deleted_entry_detection() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let log = AuditLog::open(&path).unwrap();
    for i in 0..3 {
        log.log(&entry(&format!("tool_{}", i), "ok")).unwrap();
    }

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    std::fs::write(&path, format!("{}\n{}\n", lines[0], lines[2])).unwrap();

    assert!(log.verify_integrity().is_err());
    assert!(AuditLog::open(&path).is_err());
}

#[test]
fn test_chain_continues_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/audit.jsonl");
    {
        let log = AuditLog::open(&path).unwrap();
        log.log(&entry("sla_sweep", "ok")).unwrap();
    }
    let log = AuditLog::open(&path).unwrap();
    log.log(&entry("triage_tickets", "ok")).unwrap();
    assert_eq!(log.verify_integrity().unwrap(), 2);
}

#[test]
fn test_period_query() {
    let dir = tempdir().unwrap();
    let log = AuditLog::open(dir.path().join("audit.jsonl")).unwrap();
    log.log(&entry("sla_sweep", "ok")).unwrap();
    let mut february = entry("triage_tickets", "ok");
    february.timestamp = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    log.log(&february).unwrap();

    let january = log.entries_for_period("2024-01").unwrap();
    assert_eq!(january.len(), 1);
    assert_eq!(january[0].tool, "sla_sweep");
    assert_eq!(log.entries_for_period("2024-03").unwrap().len(), 0);
}

#[tokio::test]
async fn test_recorder_writes_through_sink() {
    let dir = tempdir().unwrap();
    let log = Arc::new(AuditLog::open(dir.path().join("audit.jsonl")).unwrap());
    let recorder = AuditRecorder::new(log.clone());

    recorder
        .record(Some(2), "resolve_ticket", &Map::new(), "error: Ticket not found")
        .await;
    log.append(&entry("sla_sweep", "ok")).await.unwrap();

    let entries = log.entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].outcome_summary, "error: Ticket not found");
    assert_eq!(recorder.pending_len(), 0);
}

#[tokio::test]
async fn test_clones_append_to_one_chain() {
    let dir = tempdir().unwrap();
    let log = AuditLog::open(dir.path().join("audit.jsonl")).unwrap();
    let other = log.clone();

    log.append(&entry("triage_tickets", "ok")).await.unwrap();
    other.append(&entry("sla_sweep", "ok")).await.unwrap();
    log.append(&entry("generate_audit_report", "ok")).await.unwrap();

    assert_eq!(log.verify_integrity().unwrap(), 3);
    let tools: Vec<String> = other.entries().unwrap().into_iter().map(|e| e.tool).collect();
    assert_eq!(tools, vec!["triage_tickets", "sla_sweep", "generate_audit_report"]);
}
