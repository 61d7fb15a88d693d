use crate::arguments::{opt_str, req_i64, ToolArgs};
use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::records::{Ticket, TicketCategory, TicketPriority, TicketStatus};
use crate::tools::base::{blocking, Tool};
use crate::traits::RecordStore;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

const TRIAGE_LIMIT: usize = 50;

pub struct TriageTicketsTool {
    store: Arc<dyn RecordStore>,
}

impl TriageTicketsTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for TriageTicketsTool {
    fn name(&self) -> &'static str {
        "triage_tickets"
    }

    fn description(&self) -> &'static str {
        "List open help desk tickets; identifies access issues for triage."
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _ctx: ExecutionContext, _args: ToolArgs) -> Result<Value, ToolError> {
        let store = self.store.clone();
        let open: Vec<Ticket> = blocking(move || Ok(store.open_tickets()?))
            .await?
            .into_iter()
            .take(TRIAGE_LIMIT)
            .collect();
        let access_issues: Vec<Value> = open
            .iter()
            .filter(|t| t.category == TicketCategory::Access)
            .map(|t| json!({"id": t.id, "title": t.title}))
            .collect();

        Ok(json!({
            "open_count": open.len(),
            "access_issues": access_issues,
        }))
    }
}

pub struct ResolveTicketTool {
    store: Arc<dyn RecordStore>,
}

impl ResolveTicketTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ResolveTicketTool {
    fn name(&self) -> &'static str {
        "resolve_ticket"
    }

    fn description(&self) -> &'static str {
        "Mark a ticket as resolved by id."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticket_id": {"type": "integer"},
                "resolution_note": {"type": "string"}
            },
            "required": ["ticket_id"]
        })
    }

    async fn execute(&self, ctx: ExecutionContext, args: ToolArgs) -> Result<Value, ToolError> {
        let ticket_id = req_i64(&args, "ticket_id")?;
        let store = self.store.clone();
        blocking(move || {
            let mut ticket = store
                .ticket(ticket_id)?
                .ok_or_else(|| ToolError::rejected("Ticket not found"))?;
            ticket.status = TicketStatus::Resolved;
            ticket.resolved_at = Some(ctx.now);
            Ok(store.update_ticket(&ticket)?)
        })
        .await?;

        if let Some(note) = opt_str(&args, "resolution_note") {
            info!("Ticket {} resolved: {}", ticket_id, note);
        }

        Ok(json!({"ticket_id": ticket_id, "status": "resolved"}))
    }
}

fn overdue_tickets(store: &dyn RecordStore, ctx: &ExecutionContext) -> Result<Vec<Ticket>, ToolError> {
    Ok(store
        .open_tickets()?
        .into_iter()
        .filter(|t| t.is_overdue(ctx.now))
        .collect())
}

pub struct SlaSweepTool {
    store: Arc<dyn RecordStore>,
}

impl SlaSweepTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SlaSweepTool {
    fn name(&self) -> &'static str {
        "sla_sweep"
    }

    fn description(&self) -> &'static str {
        "List tickets that are overdue (past SLA due date)."
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, ctx: ExecutionContext, _args: ToolArgs) -> Result<Value, ToolError> {
        let store = self.store.clone();
        let overdue = blocking(move || overdue_tickets(store.as_ref(), &ctx)).await?;
        let ids: Vec<i64> = overdue.iter().map(|t| t.id).collect();
        Ok(json!({"overdue_count": ids.len(), "ticket_ids": ids}))
    }
}

pub struct EscalateOverdueTicketsTool {
    store: Arc<dyn RecordStore>,
}

impl EscalateOverdueTicketsTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for EscalateOverdueTicketsTool {
    fn name(&self) -> &'static str {
        "escalate_overdue_tickets"
    }

    fn description(&self) -> &'static str {
        "Escalate overdue open tickets by setting priority to HIGH."
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, ctx: ExecutionContext, _args: ToolArgs) -> Result<Value, ToolError> {
        let store = self.store.clone();
        let ids = blocking(move || {
            let overdue = overdue_tickets(store.as_ref(), &ctx)?;
            let mut ids = Vec::with_capacity(overdue.len());
            for mut ticket in overdue {
                ticket.priority = TicketPriority::High;
                store.update_ticket(&ticket)?;
                ids.push(ticket.id);
            }
            Ok(ids)
        })
        .await?;
        Ok(json!({"escalated_count": ids.len(), "ticket_ids": ids}))
    }
}
