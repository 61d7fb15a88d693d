//! Named goals with a known required completion set.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub goal: &'static str,
    /// Tools that must appear in the action log before the run may finish.
    pub required_tools: &'static [&'static str],
}

pub const DAILY_OPS_DEMO_GOAL: &str = "Run the full daily operations demo. Do the following in order:

1. Refresh the public dataset cache (source_id: somerville).
2. Triage help desk tickets and resolve any access-issue tickets (call triage_tickets, then resolve_ticket for each access issue).
3. Run SLA sweep, then escalate all overdue tickets.
4. Run inventory compliance check. For each out-of-compliance device, create a patch record (create_patch_record) and optionally mark it as scheduled.
5. Generate the monthly municipal court operations report bundle (generate_monthly_operations_report).
6. Generate the Revenue at Risk (FTA) report (generate_revenue_at_risk_report).
7. Generate the monthly audit report (generate_audit_report).
8. Create a change request with title \"New ordinance requires new disposition code\", requested_by \"Court Manager\", and proposed_change \"Add new disposition code to case management for ordinance compliance.\" Then generate its docs (generate_change_request_docs).

After each step, report any artifact paths (reports/YYYY-MM/..., docs/generated/...). End with a short summary.";

pub const CHANGE_REQUEST_DOCS_GOAL: &str = "Create a change request with title \"New ordinance requires new disposition code\", requested_by \"Court Manager\", and proposed_change \"Add new disposition code to case management for ordinance compliance.\" Then generate its documentation with generate_change_request_docs using the returned change_request_id. Report the generated paths.";

pub const COMPLIANCE_SWEEP_GOAL: &str = "Run the inventory compliance check. For each out-of-compliance device, create a patch record (create_patch_record) with the device asset tag, using patch_type \"device\" and a title describing the reason. Summarize how many devices were out of compliance and which patch records were created.";

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "daily_ops_demo",
        description: "Full daily operations sequence, ending with change request docs",
        goal: DAILY_OPS_DEMO_GOAL,
        required_tools: &[
            "refresh_public_dataset",
            "triage_tickets",
            "sla_sweep",
            "escalate_overdue_tickets",
            "inventory_compliance_check",
            "generate_monthly_operations_report",
            "generate_revenue_at_risk_report",
            "generate_audit_report",
            "create_change_request",
            "generate_change_request_docs",
        ],
    },
    Preset {
        name: "change_request_docs",
        description: "Create a change request and generate its document set",
        goal: CHANGE_REQUEST_DOCS_GOAL,
        required_tools: &["create_change_request", "generate_change_request_docs"],
    },
    Preset {
        name: "compliance_sweep",
        description: "Inventory compliance check with patch records for failing devices",
        goal: COMPLIANCE_SWEEP_GOAL,
        required_tools: &["inventory_compliance_check"],
    },
];

pub fn find_preset(name: &str) -> Option<&'static Preset> {
    let name = name.trim();
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

pub fn preset_names() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.name).collect()
}
