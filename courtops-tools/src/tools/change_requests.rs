use crate::arguments::{opt_str, req_i64, req_str, ToolArgs};
use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::records::NewChangeRequest;
use crate::tools::base::{blocking, Tool};
use crate::traits::{DocsGenerator, RecordStore};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct CreateChangeRequestTool {
    store: Arc<dyn RecordStore>,
}

impl CreateChangeRequestTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CreateChangeRequestTool {
    fn name(&self) -> &'static str {
        "create_change_request"
    }

    fn description(&self) -> &'static str {
        "Create a change request record."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "requested_by": {"type": "string"},
                "current_process": {"type": "string"},
                "proposed_change": {"type": "string"},
                "impact_users": {"type": "string"},
                "impact_data": {"type": "string"},
                "impact_security": {"type": "string"}
            },
            "required": ["title", "requested_by", "current_process", "proposed_change"]
        })
    }

    async fn execute(&self, _ctx: ExecutionContext, args: ToolArgs) -> Result<Value, ToolError> {
        let request = NewChangeRequest {
            title: req_str(&args, "title")?,
            requested_by: req_str(&args, "requested_by")?,
            current_process: opt_str(&args, "current_process").unwrap_or_default(),
            proposed_change: req_str(&args, "proposed_change")?,
            impact_users: opt_str(&args, "impact_users").unwrap_or_default(),
            impact_data: opt_str(&args, "impact_data").unwrap_or_default(),
            impact_security: opt_str(&args, "impact_security").unwrap_or_default(),
        };
        let store = self.store.clone();
        let created = blocking(move || Ok(store.create_change_request(request)?)).await?;
        Ok(json!({"change_request_id": created.id, "title": created.title}))
    }
}

pub struct ChangeRequestDocsTool {
    store: Arc<dyn RecordStore>,
    docs: Arc<dyn DocsGenerator>,
}

impl ChangeRequestDocsTool {
    pub fn new(store: Arc<dyn RecordStore>, docs: Arc<dyn DocsGenerator>) -> Self {
        Self { store, docs }
    }
}

#[async_trait]
impl Tool for ChangeRequestDocsTool {
    fn name(&self) -> &'static str {
        "generate_change_request_docs"
    }

    fn description(&self) -> &'static str {
        "Generate functional spec, SOP update, and release notes for a change request under docs/generated."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"change_request_id": {"type": "integer"}},
            "required": ["change_request_id"]
        })
    }

    async fn execute(&self, _ctx: ExecutionContext, args: ToolArgs) -> Result<Value, ToolError> {
        let id = req_i64(&args, "change_request_id")?;
        let store = self.store.clone();
        let docs = self.docs.clone();
        let paths = blocking(move || {
            let request = store
                .change_request(id)?
                .ok_or_else(|| ToolError::rejected("Change request not found"))?;
            Ok(docs.change_request_docs(&request)?)
        })
        .await?;
        Ok(json!({"change_request_id": id, "paths": paths}))
    }
}
