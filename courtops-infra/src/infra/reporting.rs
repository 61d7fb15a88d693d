//! Report bundles under `reports/<period>/`.

use crate::infra::audit_log::AuditLog;
use crate::infra::workspace::{Workspace, REPORTS_DIR};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use courtops_tools::records::{Case, CaseStatus, GROUP_ORDINANCE, GROUP_OTHER, GROUP_TRAFFIC};
use courtops_tools::{AuditEntry, CollaboratorError, RecordStore, ReportGenerator};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;

pub const MIN_DAYS_OVERDUE: i64 = 90;
pub const FAILURE_BURST_THRESHOLD: usize = 5;
pub const FAILURE_BURST_WINDOW_MINUTES: i64 = 15;

pub struct FileReportGenerator {
    workspace: Workspace,
    store: Arc<dyn RecordStore>,
    audit: Arc<AuditLog>,
}

impl FileReportGenerator {
    pub fn new(workspace: Workspace, store: Arc<dyn RecordStore>, audit: Arc<AuditLog>) -> Self {
        Self {
            workspace,
            store,
            audit,
        }
    }

    fn write(&self, period: &str, file_name: &str, body: &str) -> Result<String, CollaboratorError> {
        let dir = self.workspace.report_dir(period)?;
        std::fs::write(dir.join(file_name), body)?;
        let relative = format!("{}/{}/{}", REPORTS_DIR, period, file_name);
        info!("Wrote report {}", relative);
        Ok(relative)
    }
}

/// One revenue-at-risk line: case, days overdue, outstanding balance.
pub type RiskRow = (Case, i64, f64);

/// FTA/warrant cases at least `min_days_overdue` past due with a positive
/// balance, grouped traffic, ordinance, other.
pub fn revenue_at_risk_groups(
    cases: Vec<Case>,
    today: NaiveDate,
    min_days_overdue: i64,
) -> Vec<(&'static str, Vec<RiskRow>, f64)> {
    let mut grouped: BTreeMap<&'static str, Vec<RiskRow>> = BTreeMap::new();
    for case in cases {
        if !matches!(case.status, CaseStatus::Fta | CaseStatus::Warrant) {
            continue;
        }
        let Some(days) = case.days_overdue(today) else {
            continue;
        };
        let balance = case.outstanding_balance();
        if days < min_days_overdue || balance <= 0.0 {
            continue;
        }
        grouped
            .entry(case.violation_group())
            .or_default()
            .push((case, days, balance));
    }

    [GROUP_TRAFFIC, GROUP_ORDINANCE, GROUP_OTHER]
        .into_iter()
        .filter_map(|name| {
            grouped.remove(name).map(|rows| {
                let subtotal = rows.iter().map(|r| r.2).sum();
                (name, rows, subtotal)
            })
        })
        .collect()
}

/// True when `threshold` failures fall inside any `window` starting at a failure.
pub fn has_failure_burst(
    mut failures: Vec<DateTime<Utc>>,
    threshold: usize,
    window: Duration,
) -> bool {
    failures.sort();
    failures.iter().enumerate().any(|(i, start)| {
        let end = *start + window;
        failures[i..].iter().take_while(|t| **t <= end).count() >= threshold
    })
}

fn outcome_class(entry: &AuditEntry) -> &'static str {
    let summary = entry.outcome_summary.as_str();
    if summary == "not whitelisted" {
        "rejected"
    } else if summary.starts_with("dry_run") {
        "dry_run"
    } else if summary.starts_with("error:") {
        "failed"
    } else {
        "ok"
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

impl ReportGenerator for FileReportGenerator {
    fn monthly_operations(&self, period: &str) -> Result<Vec<String>, CollaboratorError> {
        let now = Utc::now();
        let cases = self.store.cases()?;
        let tickets = self.store.all_tickets()?;
        let devices = self.store.devices()?;
        let patches = self.store.patches()?;

        let open = tickets.iter().filter(|t| t.is_open()).count();
        let overdue = tickets.iter().filter(|t| t.is_overdue(now)).count();
        let fta = cases
            .iter()
            .filter(|c| matches!(c.status, CaseStatus::Fta | CaseStatus::Warrant))
            .count();
        let outstanding: f64 = cases.iter().map(|c| c.outstanding_balance()).sum();

        let mut body = String::new();
        let _ = writeln!(body, "# Municipal Court Operations - Monthly Summary\n");
        let _ = writeln!(body, "Period: {}", period);
        let _ = writeln!(body, "Generated at (UTC): {}\n", now.to_rfc3339());
        let _ = writeln!(body, "## Key Metrics\n");
        let _ = writeln!(body, "- Total cases in system: {}", cases.len());
        let _ = writeln!(body, "- Cases in FTA or warrant status: {}", fta);
        let _ = writeln!(body, "- Outstanding balance: ${:.2}", outstanding);
        let _ = writeln!(body, "- Total help desk tickets: {}", tickets.len());
        let _ = writeln!(body, "- Open tickets: {}", open);
        let _ = writeln!(body, "- Tickets past SLA: {}", overdue);
        let _ = writeln!(body, "- Tracked hardware assets: {}", devices.len());
        let _ = writeln!(body, "- Patch records: {}", patches.len());

        let report_name = format!("monthly_operations_{}.md", period);
        let report = self.write(period, &report_name, &body)?;
        let summary = self.write(
            period,
            "summary.txt",
            &format!("Monthly report generated for {}\nReport: {}\n", period, report_name),
        )?;
        Ok(vec![report, summary])
    }

    fn revenue_at_risk(&self, period: &str) -> Result<String, CollaboratorError> {
        let today = Utc::now().date_naive();
        let groups = revenue_at_risk_groups(self.store.cases()?, today, MIN_DAYS_OVERDUE);

        let mut body = String::from("group,citation,defendant,days_overdue,outstanding_balance\n");
        let mut total = 0.0;
        for (group, rows, subtotal) in &groups {
            total += subtotal;
            for (case, days, balance) in rows {
                let days = if *days >= 120 {
                    format!("{}+", days)
                } else {
                    days.to_string()
                };
                let _ = writeln!(
                    body,
                    "{},{},{},{},{:.2}",
                    csv_field(group),
                    csv_field(&case.case_number),
                    csv_field(&case.defendant_name),
                    days,
                    balance
                );
            }
            let _ = writeln!(body, "{},Subtotal,,,{:.2}", csv_field(group), subtotal);
        }
        let _ = writeln!(body, "TOTAL REVENUE AT RISK,,,,{:.2}", total);

        self.write(period, "revenue_at_risk_fta.csv", &body)
    }

    fn audit_report(&self, period: &str) -> Result<String, CollaboratorError> {
        let entries = self.audit.entries_for_period(period)?;

        let mut counts: BTreeMap<(String, &'static str), usize> = BTreeMap::new();
        let mut failures = Vec::new();
        for entry in &entries {
            let class = outcome_class(entry);
            *counts.entry((entry.tool.clone(), class)).or_default() += 1;
            if matches!(class, "failed" | "rejected") {
                failures.push(entry.timestamp);
            }
        }
        let failed_total = failures.len();
        let burst = has_failure_burst(
            failures,
            FAILURE_BURST_THRESHOLD,
            Duration::minutes(FAILURE_BURST_WINDOW_MINUTES),
        );

        let mut body = String::new();
        let _ = writeln!(body, "Agent Tool Audit Report");
        let _ = writeln!(body, "Period: {}", period);
        let _ = writeln!(body, "Generated at (UTC): {}", Utc::now().to_rfc3339());
        let _ = writeln!(body, "Total tool calls: {}", entries.len());
        let _ = writeln!(body, "Failed or rejected calls: {}\n", failed_total);
        let _ = writeln!(body, "Calls by tool and outcome:");
        for ((tool, class), count) in &counts {
            let _ = writeln!(body, "  {:<40} {:<10} {}", tool, class, count);
        }
        let _ = writeln!(body);
        if burst {
            let _ = writeln!(
                body,
                "FLAG: {} or more failed tool calls within {} minutes.",
                FAILURE_BURST_THRESHOLD, FAILURE_BURST_WINDOW_MINUTES
            );
        } else {
            let _ = writeln!(body, "No failure bursts detected.");
        }

        self.write(period, &format!("audit_report_{}.txt", period), &body)
    }
}
