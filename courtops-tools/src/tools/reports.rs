use crate::arguments::{opt_str, ToolArgs};
use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::tools::base::{blocking, Tool};
use crate::traits::ReportGenerator;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::Arc;

fn period_schema() -> Value {
    json!({
        "type": "object",
        "properties": {"period": {"type": "string", "description": "YYYY-MM, optional"}}
    })
}

/// `period` argument as `YYYY-MM`, defaulting to the current month.
pub fn resolve_period(args: &ToolArgs, ctx: &ExecutionContext) -> Result<String, ToolError> {
    let period = opt_str(args, "period").unwrap_or_else(|| ctx.current_period());
    let well_formed = period.len() == 7
        && NaiveDate::parse_from_str(&format!("{}-01", period), "%Y-%m-%d").is_ok();
    if !well_formed {
        return Err(ToolError::rejected(format!(
            "Invalid period: {} (expected YYYY-MM)",
            period
        )));
    }
    Ok(period)
}

pub struct MonthlyOperationsReportTool {
    reports: Arc<dyn ReportGenerator>,
}

impl MonthlyOperationsReportTool {
    pub fn new(reports: Arc<dyn ReportGenerator>) -> Self {
        Self { reports }
    }
}

#[async_trait]
impl Tool for MonthlyOperationsReportTool {
    fn name(&self) -> &'static str {
        "generate_monthly_operations_report"
    }

    fn description(&self) -> &'static str {
        "Generate the monthly municipal court operations report bundle (summary + metrics) under reports/YYYY-MM."
    }

    fn schema(&self) -> Value {
        period_schema()
    }

    async fn execute(&self, ctx: ExecutionContext, args: ToolArgs) -> Result<Value, ToolError> {
        let period = resolve_period(&args, &ctx)?;
        let reports = self.reports.clone();
        let target = period.clone();
        let files = blocking(move || Ok(reports.monthly_operations(&target)?)).await?;
        Ok(json!({
            "period": period,
            "path": format!("reports/{}/", period),
            "files": files,
        }))
    }
}

pub struct RevenueAtRiskReportTool {
    reports: Arc<dyn ReportGenerator>,
}

impl RevenueAtRiskReportTool {
    pub fn new(reports: Arc<dyn ReportGenerator>) -> Self {
        Self { reports }
    }
}

#[async_trait]
impl Tool for RevenueAtRiskReportTool {
    fn name(&self) -> &'static str {
        "generate_revenue_at_risk_report"
    }

    fn description(&self) -> &'static str {
        "Generate the Revenue at Risk (FTA) report under reports/YYYY-MM."
    }

    fn schema(&self) -> Value {
        period_schema()
    }

    async fn execute(&self, ctx: ExecutionContext, args: ToolArgs) -> Result<Value, ToolError> {
        let period = resolve_period(&args, &ctx)?;
        let reports = self.reports.clone();
        let target = period.clone();
        let path = blocking(move || Ok(reports.revenue_at_risk(&target)?)).await?;
        Ok(json!({"period": period, "path": path}))
    }
}

pub struct AuditReportTool {
    reports: Arc<dyn ReportGenerator>,
}

impl AuditReportTool {
    pub fn new(reports: Arc<dyn ReportGenerator>) -> Self {
        Self { reports }
    }
}

#[async_trait]
impl Tool for AuditReportTool {
    fn name(&self) -> &'static str {
        "generate_audit_report"
    }

    fn description(&self) -> &'static str {
        "Generate monthly audit report (text) under reports/YYYY-MM."
    }

    fn schema(&self) -> Value {
        period_schema()
    }

    async fn execute(&self, ctx: ExecutionContext, args: ToolArgs) -> Result<Value, ToolError> {
        let period = resolve_period(&args, &ctx)?;
        let reports = self.reports.clone();
        let target = period.clone();
        let path = blocking(move || Ok(reports.audit_report(&target)?)).await?;
        Ok(json!({"period": period, "path": path}))
    }
}
