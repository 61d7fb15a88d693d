pub mod base;
pub mod change_requests;
pub mod inventory;
pub mod patches;
pub mod public_data;
pub mod reports;
pub mod tickets;

pub use base::{blocking, Tool, ToolResult, ToolSpec, DRY_RUN_MESSAGE};
pub use change_requests::{ChangeRequestDocsTool, CreateChangeRequestTool};
pub use inventory::InventoryComplianceTool;
pub use patches::{CreatePatchRecordTool, MarkPatchStatusTool};
pub use public_data::RefreshPublicDatasetTool;
pub use reports::{AuditReportTool, MonthlyOperationsReportTool, RevenueAtRiskReportTool};
pub use tickets::{EscalateOverdueTicketsTool, ResolveTicketTool, SlaSweepTool, TriageTicketsTool};

use crate::traits::{DatasetSource, DocsGenerator, RecordStore, ReportGenerator};
use std::sync::Arc;

/// Every tool the agent may invoke, in the order they are advertised.
pub const TOOL_WHITELIST: &[&str] = &[
    "triage_tickets",
    "resolve_ticket",
    "sla_sweep",
    "escalate_overdue_tickets",
    "inventory_compliance_check",
    "create_patch_record",
    "mark_patch_status",
    "generate_monthly_operations_report",
    "generate_revenue_at_risk_report",
    "generate_audit_report",
    "create_change_request",
    "generate_change_request_docs",
    "refresh_public_dataset",
];

/// Side-effecting services the court operations tools act on.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn RecordStore>,
    pub reports: Arc<dyn ReportGenerator>,
    pub docs: Arc<dyn DocsGenerator>,
    pub dataset: Arc<dyn DatasetSource>,
}

/// Build one handler per whitelisted tool.
pub fn ops_tools(c: &Collaborators) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(TriageTicketsTool::new(c.store.clone())),
        Arc::new(ResolveTicketTool::new(c.store.clone())),
        Arc::new(SlaSweepTool::new(c.store.clone())),
        Arc::new(EscalateOverdueTicketsTool::new(c.store.clone())),
        Arc::new(InventoryComplianceTool::new(c.store.clone())),
        Arc::new(CreatePatchRecordTool::new(c.store.clone())),
        Arc::new(MarkPatchStatusTool::new(c.store.clone())),
        Arc::new(MonthlyOperationsReportTool::new(c.reports.clone())),
        Arc::new(RevenueAtRiskReportTool::new(c.reports.clone())),
        Arc::new(AuditReportTool::new(c.reports.clone())),
        Arc::new(CreateChangeRequestTool::new(c.store.clone())),
        Arc::new(ChangeRequestDocsTool::new(c.store.clone(), c.docs.clone())),
        Arc::new(RefreshPublicDatasetTool::new(c.dataset.clone())),
    ]
}
