use crate::arguments::ToolArgs;
use crate::audit::{truncate_chars, AuditRecorder, OUTCOME_SUMMARY_CHARS};
use crate::error::ToolError;
use crate::execution_context::ExecutionContext;
use crate::registry::ToolRegistry;
use crate::tools::{Tool, ToolResult};
use serde_json::Value;
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{error, info, warn};

pub const OUTCOME_NOT_WHITELISTED: &str = "not whitelisted";
pub const OUTCOME_DRY_RUN: &str = "dry_run: no execution";

/// Runs whitelisted tools and shapes every outcome into a [`ToolResult`].
/// Each call to [`ToolExecutor::execute`] writes exactly one audit entry.
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    audit: Arc<AuditRecorder>,
    timeout_ms: u64,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, audit: Arc<AuditRecorder>, timeout_ms: u64) -> Self {
        Self {
            registry,
            audit,
            timeout_ms,
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub async fn execute(
        &self,
        user_id: Option<i64>,
        tool_name: &str,
        args: &ToolArgs,
        dry_run: bool,
    ) -> ToolResult {
        let tool = match self.registry.get(tool_name) {
            Some(tool) => tool,
            None => {
                warn!("Rejected non-whitelisted tool: {}", tool_name);
                self.audit
                    .record(user_id, tool_name, args, OUTCOME_NOT_WHITELISTED)
                    .await;
                return ToolResult::failed(ToolError::NotWhitelisted(tool_name.to_string()).to_string());
            }
        };

        if dry_run {
            info!("Dry run: {}", tool_name);
            self.audit.record(user_id, tool_name, args, OUTCOME_DRY_RUN).await;
            return ToolResult::dry_run();
        }

        let ctx = ExecutionContext::new(user_id, self.timeout_ms);
        info!("Executing tool: {} (call {})", tool_name, ctx.call_ref);
        let outcome = self.execute_with_protection(tool, ctx, args.clone()).await;
        let result = shape_outcome(tool_name, outcome);

        let summary = outcome_summary(&result);
        self.audit.record(user_id, tool_name, args, &summary).await;

        result
    }

    /// Record a call that was refused before reaching the registry (quota,
    /// policy) and return the failed envelope the caller should surface.
    pub async fn refuse(
        &self,
        user_id: Option<i64>,
        tool_name: &str,
        args: &ToolArgs,
        reason: &str,
    ) -> ToolResult {
        warn!("Refused tool call {}: {}", tool_name, reason);
        let result = ToolResult::failed(truncate_chars(reason, OUTCOME_SUMMARY_CHARS));
        self.audit
            .record(user_id, tool_name, args, &outcome_summary(&result))
            .await;
        result
    }

    async fn execute_with_protection(
        &self,
        tool: Arc<dyn Tool>,
        ctx: ExecutionContext,
        args: ToolArgs,
    ) -> Result<Value, ToolError> {
        let timeout_ms = ctx.timeout_ms;
        let call_ref = ctx.call_ref.clone();

        // Spawned so a panicking handler surfaces as a JoinError.
        let mut handle = tokio::spawn(async move { tool.execute(ctx, args).await });

        match timeout(Duration::from_millis(timeout_ms), &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                if join_err.is_panic() {
                    error!("Tool execution panicked (call {})", call_ref);
                } else {
                    error!("Tool execution cancelled (call {})", call_ref);
                }
                Err(ToolError::Internal)
            }
            Err(_) => {
                // The handler must not keep running once the timeout is reported.
                handle.abort();
                let _ = handle.await;
                warn!("Tool execution timed out after {}ms (call {})", timeout_ms, call_ref);
                Err(ToolError::Timeout)
            }
        }
    }
}

/// Apply the failure policy: handler errors and returned objects carrying an
/// `error` key both become `success=false`.
fn shape_outcome(tool_name: &str, outcome: Result<Value, ToolError>) -> ToolResult {
    match outcome {
        Ok(value) => match value.get("error") {
            Some(err) if !err.is_null() => {
                let msg = match err {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                warn!("{} reported error: {}", tool_name, msg);
                ToolResult::failed(truncate_chars(&msg, OUTCOME_SUMMARY_CHARS))
            }
            _ => ToolResult::ok(value),
        },
        Err(e @ (ToolError::Rejected(_) | ToolError::MissingArgument(_))) => {
            warn!("{} rejected: {}", tool_name, e);
            ToolResult::failed(truncate_chars(&e.to_string(), OUTCOME_SUMMARY_CHARS))
        }
        Err(e) => {
            error!("{} failed: {}", tool_name, e);
            ToolResult::failed(truncate_chars(&e.to_string(), OUTCOME_SUMMARY_CHARS))
        }
    }
}

fn outcome_summary(result: &ToolResult) -> String {
    match (&result.error, &result.result) {
        (Some(err), _) => format!("error: {}", err),
        (None, Some(value)) => value.to_string(),
        (None, None) => result.message.clone().unwrap_or_default(),
    }
}
