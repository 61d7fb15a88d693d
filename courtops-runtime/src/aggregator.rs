//! Final run result assembly.

use crate::types::{Message, Role};
use courtops_tools::{ToolArgs, ToolResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One executed tool call, in call order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub tool: String,
    pub args: ToolArgs,
    pub result: ToolResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model finished with every required tool recorded.
    Completed,
    /// The model returned neither content nor tool calls.
    EmptyResponse,
    TurnLimit,
    Deadline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub summary: String,
    pub actions_taken: Vec<ActionRecord>,
    pub artifact_paths: Vec<String>,
    pub dry_run: bool,
    pub stop_reason: StopReason,
    pub turns: usize,
}

impl RunResult {
    /// Names of tools called, in call order, repeats included.
    pub fn tools_called(&self) -> Vec<&str> {
        self.actions_taken.iter().map(|a| a.tool.as_str()).collect()
    }
}

/// Everything the orchestrator accumulated over one run.
pub struct RunOutcome {
    pub transcript: Vec<Message>,
    pub actions: Vec<ActionRecord>,
    pub artifacts: Vec<String>,
    pub dry_run: bool,
    pub stop_reason: StopReason,
    pub turns: usize,
}

pub fn aggregate(outcome: RunOutcome) -> RunResult {
    RunResult {
        summary: summarize(&outcome.transcript, outcome.actions.len()),
        actions_taken: outcome.actions,
        artifact_paths: dedup_preserving_order(outcome.artifacts),
        dry_run: outcome.dry_run,
        stop_reason: outcome.stop_reason,
        turns: outcome.turns,
    }
}

/// The closing assistant message if the transcript ends on one with content,
/// otherwise a count of recorded actions (empty when there were none).
pub fn summarize(transcript: &[Message], action_count: usize) -> String {
    match transcript.last() {
        Some(last) if last.role == Role::Assistant => {
            if let Some(text) = last.text() {
                return text.to_string();
            }
        }
        _ => {}
    }
    if action_count > 0 {
        format!(
            "Completed {} tool call(s). See actions_taken for details.",
            action_count
        )
    } else {
        String::new()
    }
}

pub fn dedup_preserving_order(paths: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::types::ToolCall;

    #[test]
    fn test_dedup_keeps_first_seen_order() {
        let paths = vec![
            "reports/2024-01/x.pdf".to_string(),
            "reports/2024-01/x.pdf".to_string(),
            "docs/generated/y.md".to_string(),
        ];
        assert_eq!(
            dedup_preserving_order(paths),
            vec!["reports/2024-01/x.pdf".to_string(), "docs/generated/y.md".to_string()]
        );
    }

    #[test]
    fn test_summary_from_final_assistant_message() {
        let transcript = vec![
            Message::system("rules"),
            Message::user("goal"),
            Message::assistant(Some("All steps done.".into()), vec![]),
        ];
        assert_eq!(summarize(&transcript, 4), "All steps done.");
    }

    #[test]
    fn test_summary_synthesized_when_transcript_ends_on_tool() {
        let transcript = vec![
            Message::user("goal"),
            Message::assistant(None, vec![ToolCall::new("c1", "sla_sweep", "{}")]),
            Message::tool("c1", "{}"),
        ];
        assert_eq!(
            summarize(&transcript, 1),
            "Completed 1 tool call(s). See actions_taken for details."
        );
        assert_eq!(summarize(&[Message::user("goal")], 0), "");
    }

    #[test]
    fn test_stop_reason_serialization() {
        assert_eq!(
            serde_json::to_string(&StopReason::EmptyResponse).unwrap(),
            r#""empty_response""#
        );
    }
}
