//! Turn loop behaviour against a scripted model and in-process tools.

use async_trait::async_trait;
use courtops_runtime::{
    Message, ModelClient, ModelResponse, Orchestrator, OrchestratorConfig, RetryPolicy, Role,
    RunRequest, RuntimeError, StopReason, ToolCall,
};
use courtops_tools::{
    AuditEntry, AuditRecorder, AuditSink, CollaboratorError, ExecutionContext, Tool, ToolArgs,
    ToolError, ToolExecutor, ToolRegistry,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct ScriptedModel {
    script: Mutex<VecDeque<Result<ModelResponse, RuntimeError>>>,
    fallback: Option<ModelResponse>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    fn new(script: Vec<Result<ModelResponse, RuntimeError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn replies(replies: Vec<ModelResponse>) -> Self {
        Self::new(replies.into_iter().map(Ok).collect())
    }

    /// Served once the script runs out.
    fn then_always(mut self, reply: ModelResponse) -> Self {
        self.fallback = Some(reply);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn transcript_at(&self, call: usize) -> Vec<Message> {
        self.seen.lock().unwrap()[call].clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Value],
    ) -> Result<ModelResponse, RuntimeError> {
        assert!(!tools.is_empty());
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(messages.to_vec());
        match self.script.lock().unwrap().pop_front() {
            Some(step) => step,
            None => Ok(self.fallback.clone().unwrap_or_default()),
        }
    }
}

struct StubTool {
    name: &'static str,
    payload: Value,
    executions: Arc<AtomicUsize>,
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        "Stub tool"
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _ctx: ExecutionContext, args: ToolArgs) -> Result<Value, ToolError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = args.get("status").and_then(Value::as_str) {
            if status == "bogus" {
                return Err(ToolError::Rejected(format!("Invalid status: {}", status)));
            }
        }
        Ok(self.payload.clone())
    }
}

#[derive(Default)]
struct MemorySink {
    entries: Mutex<Vec<AuditEntry>>,
}

#[async_trait]
impl AuditSink for MemorySink {
    async fn append(&self, entry: &AuditEntry) -> Result<(), CollaboratorError> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

struct Harness {
    executions: Arc<AtomicUsize>,
    sink: Arc<MemorySink>,
    executor: Arc<ToolExecutor>,
}

const NAMES: &[&str] = &["sla_sweep", "generate_audit_report", "generate_change_request_docs", "mark_patch_status"];

fn harness() -> Harness {
    let executions = Arc::new(AtomicUsize::new(0));
    let payloads = [
        json!({"overdue_count": 0, "ticket_ids": []}),
        json!({"period": "2024-01", "path": "reports/2024-01/x.pdf"}),
        json!({"change_request_id": 1, "paths": ["docs/generated/y.md"]}),
        json!({"patch_id": 1, "status": "deployed"}),
    ];
    let tools: Vec<Arc<dyn Tool>> = NAMES
        .iter()
        .copied()
        .zip(payloads)
        .map(|(name, payload)| {
            Arc::new(StubTool {
                name,
                payload,
                executions: executions.clone(),
            }) as Arc<dyn Tool>
        })
        .collect();
    let registry = Arc::new(ToolRegistry::from_whitelist(NAMES, tools).unwrap());
    let sink = Arc::new(MemorySink::default());
    let audit = Arc::new(AuditRecorder::new(sink.clone()));
    Harness {
        executions,
        sink,
        executor: Arc::new(ToolExecutor::new(registry, audit, 1_000)),
    }
}

fn config() -> OrchestratorConfig {
    OrchestratorConfig {
        retry: RetryPolicy::new(3, Duration::from_millis(1)),
        ..Default::default()
    }
}

fn call(id: &str, name: &str, args: &str) -> ToolCall {
    ToolCall::new(id, name, args)
}

fn calls(list: Vec<ToolCall>) -> ModelResponse {
    ModelResponse::calls(list)
}

#[tokio::test]
async fn test_turn_bound_caps_model_calls() {
    let h = harness();
    let model = Arc::new(ScriptedModel::new(vec![]).then_always(calls(vec![call("c", "sla_sweep", "{}")])));
    let orchestrator = Orchestrator::new(
        model.clone(),
        h.executor.clone(),
        OrchestratorConfig {
            max_turns: 5,
            ..config()
        },
    );

    let result = orchestrator.run(RunRequest::new("Sweep forever")).await.unwrap();

    assert_eq!(model.calls(), 5);
    assert_eq!(result.turns, 5);
    assert_eq!(result.stop_reason, StopReason::TurnLimit);
    assert_eq!(result.actions_taken.len(), 5);
    assert_eq!(
        result.summary,
        "Completed 5 tool call(s). See actions_taken for details."
    );
}

#[tokio::test]
async fn test_completion_enforced_until_required_tools_recorded() {
    let h = harness();
    let model = Arc::new(ScriptedModel::replies(vec![
        calls(vec![call("c1", "sla_sweep", "{}")]),
        ModelResponse::text("All done."),
        calls(vec![call("c2", "generate_audit_report", r#"{"period":"2024-01"}"#)]),
        ModelResponse::text("Sweep and audit report complete."),
    ]));
    let orchestrator = Orchestrator::new(model.clone(), h.executor.clone(), config());

    let request = RunRequest::new("Sweep then report")
        .require(["sla_sweep", "generate_audit_report"]);
    let result = orchestrator.run(request).await.unwrap();

    assert_eq!(result.stop_reason, StopReason::Completed);
    assert_eq!(result.turns, 4);
    assert_eq!(result.tools_called(), vec!["sla_sweep", "generate_audit_report"]);
    assert_eq!(result.summary, "Sweep and audit report complete.");

    let third = model.transcript_at(2);
    let nudge = third.last().unwrap();
    assert_eq!(nudge.role, Role::User);
    assert!(nudge.text().unwrap().contains("generate_audit_report"));
    assert!(!nudge.text().unwrap().contains("sla_sweep"));
}

#[tokio::test]
async fn test_premature_finish_never_completes() {
    let h = harness();
    let model = Arc::new(
        ScriptedModel::replies(vec![calls(vec![call("c1", "sla_sweep", "{}")])])
            .then_always(ModelResponse::text("Finished.")),
    );
    let orchestrator = Orchestrator::new(
        model.clone(),
        h.executor.clone(),
        OrchestratorConfig {
            max_turns: 4,
            ..config()
        },
    );

    let request = RunRequest::new("Sweep then report")
        .require(["sla_sweep", "generate_audit_report"]);
    let result = orchestrator.run(request).await.unwrap();

    assert_eq!(result.stop_reason, StopReason::TurnLimit);
    assert_eq!(model.calls(), 4);
    assert_eq!(result.tools_called(), vec!["sla_sweep"]);
}

#[tokio::test]
async fn test_artifacts_deduplicated_in_first_seen_order() {
    let h = harness();
    let model = Arc::new(ScriptedModel::replies(vec![
        calls(vec![
            call("c1", "generate_audit_report", "{}"),
            call("c2", "generate_audit_report", "{}"),
        ]),
        calls(vec![call("c3", "generate_change_request_docs", r#"{"change_request_id":1}"#)]),
        ModelResponse::text("Reports written."),
    ]));
    let orchestrator = Orchestrator::new(model, h.executor.clone(), config());

    let result = orchestrator
        .run(RunRequest::new("Write reports").dry_run(false))
        .await
        .unwrap();

    assert_eq!(
        result.artifact_paths,
        vec!["reports/2024-01/x.pdf".to_string(), "docs/generated/y.md".to_string()]
    );
    assert!(!result.dry_run);
}

#[tokio::test]
async fn test_dry_run_executes_nothing() {
    let h = harness();
    let model = Arc::new(ScriptedModel::replies(vec![
        calls(vec![
            call("c1", "generate_audit_report", "{}"),
            call("c2", "mark_patch_status", r#"{"patch_id":1}"#),
        ]),
        ModelResponse::text("Nothing changed."),
    ]));
    let orchestrator = Orchestrator::new(model, h.executor.clone(), config());

    let result = orchestrator.run(RunRequest::new("Preview")).await.unwrap();

    assert!(result.dry_run);
    assert_eq!(h.executions.load(Ordering::SeqCst), 0);
    assert!(result.artifact_paths.is_empty());
    assert!(result
        .actions_taken
        .iter()
        .all(|a| a.result.success && a.result.dry_run));
    assert_eq!(h.sink.entries.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_tool_does_not_abort_run() {
    let h = harness();
    let model = Arc::new(ScriptedModel::replies(vec![
        calls(vec![call("c1", "mark_patch_status", r#"{"patch_id":1,"status":"bogus"}"#)]),
        calls(vec![call("c2", "sla_sweep", "{}")]),
        ModelResponse::text("Patch update failed; sweep done."),
    ]));
    let orchestrator = Orchestrator::new(model.clone(), h.executor.clone(), config());

    let result = orchestrator
        .run(RunRequest::new("Update patch").dry_run(false))
        .await
        .unwrap();

    let first = &result.actions_taken[0].result;
    assert!(!first.success);
    assert_eq!(first.error.as_deref(), Some("Invalid status: bogus"));
    assert_eq!(result.actions_taken.len(), 2);

    let second_turn = model.transcript_at(1);
    let tool_msg = second_turn.last().unwrap();
    assert_eq!(tool_msg.role, Role::Tool);
    assert_eq!(tool_msg.tool_call_id.as_deref(), Some("c1"));
    assert!(tool_msg.text().unwrap().contains("Invalid status: bogus"));
}

#[tokio::test]
async fn test_calls_dispatched_in_issue_order() {
    let h = harness();
    let model = Arc::new(ScriptedModel::replies(vec![
        calls(vec![
            call("c1", "generate_change_request_docs", "{}"),
            call("c2", "sla_sweep", "{}"),
            call("c3", "generate_audit_report", "{}"),
        ]),
        ModelResponse::text("Done."),
    ]));
    let orchestrator = Orchestrator::new(model.clone(), h.executor.clone(), config());

    let result = orchestrator.run(RunRequest::new("Batch")).await.unwrap();

    assert_eq!(
        result.tools_called(),
        vec!["generate_change_request_docs", "sla_sweep", "generate_audit_report"]
    );
    let ids: Vec<_> = model
        .transcript_at(1)
        .iter()
        .filter(|m| m.role == Role::Tool)
        .filter_map(|m| m.tool_call_id.clone())
        .collect();
    assert_eq!(ids, vec!["c1", "c2", "c3"]);
}

#[tokio::test]
async fn test_empty_response_stops_run() {
    let h = harness();
    let model = Arc::new(ScriptedModel::replies(vec![
        calls(vec![call("c1", "sla_sweep", "{}")]),
        ModelResponse::default(),
    ]));
    let orchestrator = Orchestrator::new(model.clone(), h.executor.clone(), config());

    let result = orchestrator
        .run(RunRequest::new("Sweep").require(["generate_audit_report"]))
        .await
        .unwrap();

    assert_eq!(result.stop_reason, StopReason::EmptyResponse);
    assert_eq!(model.calls(), 2);
    assert_eq!(
        result.summary,
        "Completed 1 tool call(s). See actions_taken for details."
    );
}

#[tokio::test]
async fn test_unknown_tool_and_malformed_arguments_recovered() {
    let h = harness();
    let model = Arc::new(ScriptedModel::replies(vec![
        calls(vec![
            call("c1", "drop_all_tables", "{}"),
            call("c2", "sla_sweep", "{not json"),
        ]),
        ModelResponse::text("Done."),
    ]));
    let orchestrator = Orchestrator::new(model, h.executor.clone(), config());

    let result = orchestrator
        .run(RunRequest::new("Misbehave").dry_run(false))
        .await
        .unwrap();

    let rejected = &result.actions_taken[0];
    assert!(!rejected.result.success);
    assert_eq!(
        rejected.result.error.as_deref(),
        Some("Tool not whitelisted: drop_all_tables")
    );
    assert!(result.actions_taken[1].args.is_empty());
    assert!(result.actions_taken[1].result.success);
    assert_eq!(h.executions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_per_tool_quota_refuses_excess_calls() {
    let h = harness();
    let model = Arc::new(ScriptedModel::replies(vec![
        calls(vec![
            call("c1", "sla_sweep", "{}"),
            call("c2", "sla_sweep", "{}"),
        ]),
        ModelResponse::text("Done."),
    ]));
    let orchestrator = Orchestrator::new(
        model,
        h.executor.clone(),
        OrchestratorConfig {
            max_calls_per_tool: Some(1),
            ..config()
        },
    );

    let result = orchestrator
        .run(RunRequest::new("Sweep twice").dry_run(false))
        .await
        .unwrap();

    assert!(result.actions_taken[0].result.success);
    assert_eq!(
        result.actions_taken[1].result.error.as_deref(),
        Some("Tool call quota exceeded: sla_sweep")
    );
    assert_eq!(h.executions.load(Ordering::SeqCst), 1);
    assert_eq!(h.sink.entries.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_transient_model_failure_is_retried() {
    let h = harness();
    let model = Arc::new(ScriptedModel::new(vec![
        Err(RuntimeError::Model("Network connection failed".into())),
        Ok(ModelResponse::text("Nothing to do.")),
    ]));
    let orchestrator = Orchestrator::new(model.clone(), h.executor.clone(), config());

    let result = orchestrator.run(RunRequest::new("Idle")).await.unwrap();

    assert_eq!(model.calls(), 2);
    assert_eq!(result.turns, 1);
    assert_eq!(result.summary, "Nothing to do.");
}

#[tokio::test]
async fn test_model_unavailable_after_retries() {
    let h = harness();
    let model = Arc::new(ScriptedModel::new(
        (0..3)
            .map(|_| Err(RuntimeError::Model("Server error: HTTP 503".into())))
            .collect(),
    ));
    let orchestrator = Orchestrator::new(model.clone(), h.executor.clone(), config());

    let err = orchestrator.run(RunRequest::new("Idle")).await.unwrap_err();

    match err {
        RuntimeError::ModelUnavailable { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("Expected ModelUnavailable, got {:?}", other),
    }
    assert_eq!(model.calls(), 3);
}

#[tokio::test]
async fn test_invalid_requests_rejected_before_model_call() {
    let h = harness();
    let model = Arc::new(ScriptedModel::new(vec![]));
    let orchestrator = Orchestrator::new(model.clone(), h.executor.clone(), config());

    let empty = orchestrator.run(RunRequest::new("   ")).await;
    assert!(matches!(empty, Err(RuntimeError::Config(_))));

    let unknown = orchestrator
        .run(RunRequest::new("Goal").require(["format_disk"]))
        .await;
    assert!(matches!(unknown, Err(RuntimeError::Config(msg)) if msg.contains("format_disk")));

    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_expired_deadline_stops_before_first_turn() {
    let h = harness();
    let model = Arc::new(ScriptedModel::new(vec![]));
    let orchestrator = Orchestrator::new(
        model.clone(),
        h.executor.clone(),
        OrchestratorConfig {
            deadline: Some(Duration::ZERO),
            ..config()
        },
    );

    let result = orchestrator.run(RunRequest::new("Anything")).await.unwrap();

    assert_eq!(result.stop_reason, StopReason::Deadline);
    assert_eq!(result.turns, 0);
    assert_eq!(model.calls(), 0);
    assert_eq!(result.summary, "");
}

#[tokio::test]
async fn test_transcript_seeded_with_system_and_goal() {
    let h = harness();
    let model = Arc::new(ScriptedModel::replies(vec![ModelResponse::text("Hi.")]));
    let orchestrator = Orchestrator::new(model.clone(), h.executor.clone(), config());

    orchestrator.run(RunRequest::new("  Check SLAs  ")).await.unwrap();

    let first = model.transcript_at(0);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].role, Role::System);
    assert_eq!(first[1].text(), Some("Check SLAs"));
}
