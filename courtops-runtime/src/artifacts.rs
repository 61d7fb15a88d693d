//! Output paths surfaced by tool results.

use courtops_tools::ToolResult;
use serde_json::Value;

pub const REPORTS_MARKER: &str = "reports/";
pub const GENERATED_DOCS_MARKER: &str = "docs/generated/";

pub fn is_artifact_path(path: &str) -> bool {
    path.starts_with(REPORTS_MARKER) || path.contains(GENERATED_DOCS_MARKER)
}

/// Artifact paths carried by a successful result's `path` or `paths` field,
/// in payload order. `path` wins when both are present.
pub fn extract_artifacts(result: &ToolResult) -> Vec<String> {
    let Some(payload) = result.result.as_ref().filter(|_| result.success) else {
        return Vec::new();
    };

    let field = payload
        .get("path")
        .filter(|v| !v.is_null())
        .or_else(|| payload.get("paths"));

    match field {
        Some(Value::String(path)) if is_artifact_path(path) => vec![path.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|p| is_artifact_path(p))
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
