use crate::arguments::ToolArgs;
use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DRY_RUN_MESSAGE: &str = "No changes made (dry run).";

/// Normalised envelope returned for every tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(result: Value) -> Self {
        Self {
            success: true,
            dry_run: false,
            message: None,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            dry_run: false,
            message: None,
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn dry_run() -> Self {
        Self {
            success: true,
            dry_run: true,
            message: Some(DRY_RUN_MESSAGE.to_string()),
            result: None,
            error: None,
        }
    }
}

/// Static description of a tool as exposed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Run synchronous collaborator work (SQLite, report files) on the blocking
/// pool so the executor's timeout can still fire while it runs. A panic in
/// `work` is resumed on the calling task.
pub async fn blocking<T, F>(work: F) -> Result<T, ToolError>
where
    F: FnOnce() -> Result<T, ToolError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(ToolError::ExecutionFailed(e.to_string())),
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn schema(&self) -> Value;

    /// Run the handler. `Err(ToolError::Rejected)` and a returned object with
    /// an `error` key are both treated as business failures by the executor.
    async fn execute(&self, ctx: ExecutionContext, args: ToolArgs) -> Result<Value, ToolError>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.schema(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shapes() {
        let ok = serde_json::to_value(ToolResult::ok(json!({"patch_id": 3}))).unwrap();
        assert_eq!(ok, json!({"success": true, "result": {"patch_id": 3}}));

        let failed = serde_json::to_value(ToolResult::failed("Patch not found")).unwrap();
        assert_eq!(failed, json!({"success": false, "error": "Patch not found"}));

        let dry = serde_json::to_value(ToolResult::dry_run()).unwrap();
        assert_eq!(
            dry,
            json!({"success": true, "dry_run": true, "message": DRY_RUN_MESSAGE})
        );
    }
}
