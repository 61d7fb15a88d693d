use chrono::Utc;
use courtops_infra::infra::seed::seed_demo_data;
use courtops_infra::{AuditLog, FileReportGenerator, MarkdownDocsGenerator, SqliteRecordStore, Workspace};
use courtops_tools::records::ChangeRequest;
use courtops_tools::{AuditEntry, DocsGenerator, RecordStore, ReportGenerator};
use std::sync::Arc;
use tempfile::tempdir;

struct Fixture {
    _dir: tempfile::TempDir,
    workspace: Workspace,
    audit: Arc<AuditLog>,
    reports: FileReportGenerator,
}

fn fixture() -> Fixture {
    let dir = tempdir().unwrap();
    let workspace = Workspace::new(dir.path());
    let store = Arc::new(SqliteRecordStore::in_memory().unwrap());
    seed_demo_data(&store, Utc::now(), false).unwrap();
    let audit = Arc::new(AuditLog::open(dir.path().join("data/audit/agent_tools.jsonl")).unwrap());
    let reports = FileReportGenerator::new(
        workspace.clone(),
        store as Arc<dyn RecordStore>,
        audit.clone(),
    );
    Fixture {
        _dir: dir,
        workspace,
        audit,
        reports,
    }
}

#[test]
fn test_monthly_bundle() {
    let fx = fixture();
    let files = fx.reports.monthly_operations("2024-01").unwrap();
    assert_eq!(
        files,
        vec![
            "reports/2024-01/monthly_operations_2024-01.md".to_string(),
            "reports/2024-01/summary.txt".to_string(),
        ]
    );
    let body = std::fs::read_to_string(fx.workspace.resolve(&files[0])).unwrap();
    assert!(body.contains("Total cases in system: 606"));
}

#[test]
fn test_revenue_at_risk_csv() {
    let fx = fixture();
    let path = fx.reports.revenue_at_risk("2024-01").unwrap();
    assert_eq!(path, "reports/2024-01/revenue_at_risk_fta.csv");

    let body = std::fs::read_to_string(fx.workspace.resolve(&path)).unwrap();
    let mut lines = body.lines();
    assert_eq!(
        lines.next(),
        Some("group,citation,defendant,days_overdue,outstanding_balance")
    );
    assert!(body.contains("E009901"));
    assert!(body.contains("C002901"));
    assert!(body.lines().last().unwrap().starts_with("TOTAL REVENUE AT RISK"));
    let traffic = body.find("Traffic Violations").unwrap();
    let ordinance = body.find("City Ordinance").unwrap();
    assert!(traffic < ordinance);
}

#[test]
fn test_audit_report_flags_failure_burst() {
    let fx = fixture();
    let now = Utc::now();
    let period = now.format("%Y-%m").to_string();
    for i in 0..6 {
        fx.audit
            .log(&AuditEntry {
                id: format!("e{}", i),
                user_id: None,
                tool: "mark_patch_status".into(),
                args_digest: "0000000000000000".into(),
                outcome_summary: "error: Invalid status: bogus".into(),
                timestamp: now,
            })
            .unwrap();
    }

    let path = fx.reports.audit_report(&period).unwrap();
    assert_eq!(path, format!("reports/{}/audit_report_{}.txt", period, period));
    let body = std::fs::read_to_string(fx.workspace.resolve(&path)).unwrap();
    assert!(body.contains("Total tool calls: 6"));
    assert!(body.contains("FLAG:"));
}

#[test]
fn test_change_request_docs() {
    let dir = tempdir().unwrap();
    let docs = MarkdownDocsGenerator::new(Workspace::new(dir.path()));
    let cr = ChangeRequest {
        id: 7,
        title: "Online payments".into(),
        requested_by: "Clerk A".into(),
        current_process: "Counter only".into(),
        proposed_change: "Add portal".into(),
        impact_users: "Clerks".into(),
        impact_data: "Payments".into(),
        impact_security: "Audit logging".into(),
        status: courtops_tools::records::ChangeRequestStatus::Draft,
    };

    let paths = docs.change_request_docs(&cr).unwrap();
    assert_eq!(
        paths,
        vec![
            "docs/generated/cr-0007-functional-spec.md",
            "docs/generated/cr-0007-sop-update.md",
            "docs/generated/cr-0007-release-notes.md",
        ]
    );
    let spec = std::fs::read_to_string(dir.path().join(&paths[0])).unwrap();
    assert!(spec.starts_with("# Functional Specification: Online payments"));
    assert!(spec.contains("- Security: Audit logging"));
}
