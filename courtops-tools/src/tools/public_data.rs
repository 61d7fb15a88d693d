use crate::arguments::{opt_str, ToolArgs};
use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::tools::base::Tool;
use crate::traits::DatasetSource;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub const DEFAULT_SOURCE: &str = "somerville";
pub const SUPPORTED_SOURCES: &[&str] = &[DEFAULT_SOURCE];

pub struct RefreshPublicDatasetTool {
    source: Arc<dyn DatasetSource>,
}

impl RefreshPublicDatasetTool {
    pub fn new(source: Arc<dyn DatasetSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Tool for RefreshPublicDatasetTool {
    fn name(&self) -> &'static str {
        "refresh_public_dataset"
    }

    fn description(&self) -> &'static str {
        "Refresh the public data cache. Use source_id 'somerville' for Somerville traffic citations."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "source_id": {"type": "string", "description": "Dataset source, e.g. somerville"}
            },
            "required": ["source_id"]
        })
    }

    async fn execute(&self, _ctx: ExecutionContext, args: ToolArgs) -> Result<Value, ToolError> {
        let source_id = opt_str(&args, "source_id")
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string());

        if !SUPPORTED_SOURCES.contains(&source_id.as_str()) {
            return Err(ToolError::rejected(format!(
                "Unknown source_id: {}. Only somerville is supported.",
                source_id
            )));
        }

        let path = self.source.refresh(&source_id).await?;
        Ok(json!({"path": path, "source_id": source_id}))
    }
}
