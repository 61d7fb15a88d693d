use crate::arguments::ToolArgs;
use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::tools::base::{blocking, Tool};
use crate::traits::RecordStore;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub const WARRANTY_WINDOW_DAYS: i64 = 30;
pub const PATCH_MAX_AGE_DAYS: i64 = 90;

pub struct InventoryComplianceTool {
    store: Arc<dyn RecordStore>,
}

impl InventoryComplianceTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for InventoryComplianceTool {
    fn name(&self) -> &'static str {
        "inventory_compliance_check"
    }

    fn description(&self) -> &'static str {
        "List devices out of compliance (warranty expiring in 30 days or last patch > 90 days ago)."
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, ctx: ExecutionContext, _args: ToolArgs) -> Result<Value, ToolError> {
        let today = ctx.today();
        let mut risky = Vec::new();

        let store = self.store.clone();
        for device in blocking(move || Ok(store.devices()?)).await? {
            if device.warranty_expiring_within(today, WARRANTY_WINDOW_DAYS) {
                risky.push(json!({"asset_tag": device.asset_tag, "reason": "warranty_expiring"}));
            } else if device
                .patch_age_days(today)
                .is_some_and(|age| age > PATCH_MAX_AGE_DAYS)
            {
                risky.push(json!({"asset_tag": device.asset_tag, "reason": "patch_overdue"}));
            }
        }

        Ok(json!({
            "out_of_compliance_count": risky.len(),
            "devices": risky,
        }))
    }
}
