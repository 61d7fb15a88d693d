//! Conversation orchestrator: the turn loop driving model calls and tool dispatch.

use crate::aggregator::{aggregate, ActionRecord, RunOutcome, RunResult, StopReason};
use crate::artifacts::extract_artifacts;
use crate::interfaces::{ModelClient, RuntimeError};
use crate::metrics::{self, MetricTimer};
use crate::presets::Preset;
use crate::prompt::{completion_nudge, SYSTEM_PROMPT};
use crate::retry::RetryPolicy;
use crate::types::{Message, ModelResponse, ToolCall};
use courtops_tools::audit::truncate_chars;
use courtops_tools::{parse_arguments, ToolArgs, ToolExecutor, ToolResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_TURNS: usize = 45;
pub const DEFAULT_TOOL_MESSAGE_CHARS: usize = 800;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on model calls per run.
    pub max_turns: usize,
    /// Tool results are cut to this many characters before entering the transcript.
    pub tool_message_chars: usize,
    pub max_calls_per_tool: Option<usize>,
    pub deadline: Option<Duration>,
    pub retry: RetryPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            tool_message_chars: DEFAULT_TOOL_MESSAGE_CHARS,
            max_calls_per_tool: None,
            deadline: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// One run invocation.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub goal: String,
    pub dry_run: bool,
    pub required_tools: Vec<String>,
    pub user_id: Option<i64>,
}

impl RunRequest {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            dry_run: true,
            ..Default::default()
        }
    }

    pub fn from_preset(preset: &Preset) -> Self {
        Self::new(preset.goal).require(preset.required_tools.iter().copied())
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn require<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tool in tools {
            let tool = tool.into();
            if !self.required_tools.contains(&tool) {
                self.required_tools.push(tool);
            }
        }
        self
    }

    pub fn user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Drives one goal to completion against a model and the tool executor.
pub struct Orchestrator {
    model: Arc<dyn ModelClient>,
    executor: Arc<ToolExecutor>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        model: Arc<dyn ModelClient>,
        executor: Arc<ToolExecutor>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            model,
            executor,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run the loop until completion, an empty model response, the turn cap
    /// or the deadline. Only model unavailability fails the run.
    pub async fn run(&self, request: RunRequest) -> Result<RunResult, RuntimeError> {
        let _timer = MetricTimer::new(metrics::RUN_DURATION);
        self.validate(&request)?;

        let registry = self.executor.registry();
        let schemas = registry.schemas();
        info!(
            "Starting run: dry_run={}, {} tools, {} required",
            request.dry_run,
            registry.count(),
            request.required_tools.len()
        );

        let started = Instant::now();
        let mut state = RunState::new(&request);
        let mut turns = 0;

        let stop_reason = loop {
            if turns >= self.config.max_turns {
                warn!("Turn limit ({}) reached", self.config.max_turns);
                break StopReason::TurnLimit;
            }
            if let Some(deadline) = self.config.deadline {
                if started.elapsed() >= deadline {
                    warn!("Run deadline of {:?} exceeded after {} turn(s)", deadline, turns);
                    break StopReason::Deadline;
                }
            }

            turns += 1;
            debug!("Turn {}/{}", turns, self.config.max_turns);
            let response = self.call_model(&state.transcript, &schemas).await?;

            if response.is_empty() {
                warn!("Model returned an empty response on turn {}", turns);
                break StopReason::EmptyResponse;
            }

            let ModelResponse {
                content,
                tool_calls,
            } = response;
            state
                .transcript
                .push(Message::assistant(content, tool_calls.clone()));

            if tool_calls.is_empty() {
                let missing = state.missing_required(&request.required_tools);
                if missing.is_empty() {
                    info!("Run completed after {} turn(s)", turns);
                    break StopReason::Completed;
                }
                info!("Model finished early; still required: {}", missing.join(", "));
                metrics::increment_completion_nudges();
                state.transcript.push(Message::user(completion_nudge(&missing)));
                continue;
            }

            for call in &tool_calls {
                self.dispatch(&request, call, &mut state).await;
            }
        };

        Ok(aggregate(RunOutcome {
            transcript: state.transcript,
            actions: state.actions,
            artifacts: state.artifacts,
            dry_run: request.dry_run,
            stop_reason,
            turns,
        }))
    }

    fn validate(&self, request: &RunRequest) -> Result<(), RuntimeError> {
        if request.goal.trim().is_empty() {
            return Err(RuntimeError::Config("goal or preset required".to_string()));
        }
        if self.config.max_turns == 0 {
            return Err(RuntimeError::Config("max_turns must be positive".to_string()));
        }
        let registry = self.executor.registry();
        if let Some(unknown) = request
            .required_tools
            .iter()
            .find(|t| !registry.is_whitelisted(t))
        {
            return Err(RuntimeError::Config(format!(
                "Required tool is not whitelisted: {}",
                unknown
            )));
        }
        Ok(())
    }

    async fn call_model(
        &self,
        transcript: &[Message],
        schemas: &[Value],
    ) -> Result<ModelResponse, RuntimeError> {
        self.config
            .retry
            .run(|| self.model.complete(transcript, schemas))
            .await
    }

    /// Execute one tool call and fold its result into the run state.
    async fn dispatch(&self, request: &RunRequest, call: &ToolCall, state: &mut RunState) {
        let args = parse_arguments(&call.raw_arguments);
        info!("Dispatching tool: {}", call.name);

        let result = {
            let _timer = MetricTimer::new(metrics::TOOL_EXECUTION_LATENCY);
            if state.over_quota(&call.name, self.config.max_calls_per_tool) {
                let reason = format!("Tool call quota exceeded: {}", call.name);
                self.executor
                    .refuse(request.user_id, &call.name, &args, &reason)
                    .await
            } else {
                self.executor
                    .execute(request.user_id, &call.name, &args, request.dry_run)
                    .await
            }
        };
        metrics::record_tool_call(&call.name, outcome_label(&result));

        state.artifacts.extend(extract_artifacts(&result));
        state.transcript.push(Message::tool(
            call.id.clone(),
            tool_message(&result, self.config.tool_message_chars),
        ));
        state.record(call.name.clone(), args, result);
    }
}

/// Mutable per-run state. Dropped when the run returns.
struct RunState {
    transcript: Vec<Message>,
    actions: Vec<ActionRecord>,
    artifacts: Vec<String>,
    calls_per_tool: HashMap<String, usize>,
}

impl RunState {
    fn new(request: &RunRequest) -> Self {
        Self {
            transcript: vec![
                Message::system(SYSTEM_PROMPT),
                Message::user(request.goal.trim()),
            ],
            actions: Vec::new(),
            artifacts: Vec::new(),
            calls_per_tool: HashMap::new(),
        }
    }

    fn over_quota(&self, tool: &str, limit: Option<usize>) -> bool {
        match limit {
            Some(limit) => self.calls_per_tool.get(tool).copied().unwrap_or(0) >= limit,
            None => false,
        }
    }

    fn record(&mut self, tool: String, args: ToolArgs, result: ToolResult) {
        *self.calls_per_tool.entry(tool.clone()).or_insert(0) += 1;
        self.actions.push(ActionRecord { tool, args, result });
    }

    /// Required tools not yet in the action log, in required order. Failed
    /// calls count as recorded.
    fn missing_required<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|name| !self.actions.iter().any(|a| &a.tool == *name))
            .map(String::as_str)
            .collect()
    }
}

fn outcome_label(result: &ToolResult) -> &'static str {
    if result.dry_run {
        "dry_run"
    } else if result.success {
        "ok"
    } else {
        "failed"
    }
}

fn tool_message(result: &ToolResult, max_chars: usize) -> String {
    let body = serde_json::to_string(result)
        .unwrap_or_else(|_| r#"{"success":false,"error":"unserializable result"}"#.to_string());
    truncate_chars(&body, max_chars)
}
