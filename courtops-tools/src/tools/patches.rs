use crate::arguments::{opt_str, req_i64, req_str, ToolArgs};
use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::records::{NewPatch, PatchStatus, PatchType};
use crate::tools::base::{blocking, Tool};
use crate::traits::RecordStore;
use async_trait::async_trait;
use chrono::Duration;
use serde_json::{json, Value};
use std::sync::Arc;

const SCHEDULE_LEAD_DAYS: i64 = 7;

pub struct CreatePatchRecordTool {
    store: Arc<dyn RecordStore>,
}

impl CreatePatchRecordTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CreatePatchRecordTool {
    fn name(&self) -> &'static str {
        "create_patch_record"
    }

    fn description(&self) -> &'static str {
        "Create a new patch record."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "patch_type": {"type": "string", "enum": ["application", "device"]},
                "target_version": {"type": "string"},
                "device_asset_tag": {"type": "string"}
            },
            "required": ["title", "patch_type"]
        })
    }

    async fn execute(&self, ctx: ExecutionContext, args: ToolArgs) -> Result<Value, ToolError> {
        let title = req_str(&args, "title")?;
        let patch_type = match opt_str(&args, "patch_type").map(|s| s.to_lowercase()) {
            Some(t) if t == "device" => PatchType::Device,
            _ => PatchType::Application,
        };
        let today = ctx.today();

        let new_patch = NewPatch {
            title,
            patch_type,
            target_version: opt_str(&args, "target_version"),
            device_asset_tag: opt_str(&args, "device_asset_tag"),
            requested_date: today,
            scheduled_date: Some(today + Duration::days(SCHEDULE_LEAD_DAYS)),
        };
        let store = self.store.clone();
        let patch = blocking(move || Ok(store.create_patch(new_patch)?)).await?;

        Ok(json!({"patch_id": patch.id, "title": patch.title}))
    }
}

pub struct MarkPatchStatusTool {
    store: Arc<dyn RecordStore>,
}

impl MarkPatchStatusTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for MarkPatchStatusTool {
    fn name(&self) -> &'static str {
        "mark_patch_status"
    }

    fn description(&self) -> &'static str {
        "Update a patch status (requested, scheduled, tested, deployed, verified)."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "patch_id": {"type": "integer"},
                "status": {
                    "type": "string",
                    "enum": ["requested", "scheduled", "tested", "deployed", "verified"]
                }
            },
            "required": ["patch_id", "status"]
        })
    }

    async fn execute(&self, ctx: ExecutionContext, args: ToolArgs) -> Result<Value, ToolError> {
        let patch_id = req_i64(&args, "patch_id")?;
        let status: PatchStatus = opt_str(&args, "status")
            .unwrap_or_else(|| PatchStatus::Deployed.to_string())
            .parse()
            .map_err(ToolError::Rejected)?;

        let store = self.store.clone();
        blocking(move || {
            let mut patch = store
                .patch(patch_id)?
                .ok_or_else(|| ToolError::rejected("Patch not found"))?;
            patch.transition(status, ctx.today());
            Ok(store.update_patch(&patch)?)
        })
        .await?;

        Ok(json!({"patch_id": patch_id, "status": status.as_str()}))
    }
}
