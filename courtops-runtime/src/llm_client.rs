//! OpenAI-compatible chat completions client (Ollama, vLLM, hosted providers).

use crate::interfaces::{ModelClient, RuntimeError};
use crate::types::{Message, ModelResponse, Role, ToolCall};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

const BREAKER_FAILURE_THRESHOLD: usize = 5;
const BREAKER_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Value]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChatToolCall {
    #[serde(default)]
    id: Option<String>,
    function: ChatFunction,
}

#[derive(Debug, Deserialize)]
struct ChatFunction {
    name: String,
    // Most providers send a JSON string; some send the object itself.
    #[serde(default)]
    arguments: Value,
}

/// Circuit breaker state.
struct CircuitBreaker {
    consecutive_failures: AtomicUsize,
    breaker_open: AtomicBool,
    opened_at: Mutex<Option<Instant>>,
    failure_threshold: usize,
    cooldown_duration: Duration,
}

impl CircuitBreaker {
    fn new(failure_threshold: usize, cooldown_duration: Duration) -> Self {
        Self {
            consecutive_failures: AtomicUsize::new(0),
            breaker_open: AtomicBool::new(false),
            opened_at: Mutex::new(None),
            failure_threshold,
            cooldown_duration,
        }
    }

    fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        self.breaker_open.store(false, Ordering::SeqCst);
        *self.opened_at.lock() = None;
    }

    fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        if failures >= self.failure_threshold {
            self.breaker_open.store(true, Ordering::SeqCst);
            *self.opened_at.lock() = Some(Instant::now());
        }
    }

    fn should_allow_request(&self) -> Result<(), RuntimeError> {
        if !self.breaker_open.load(Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(opened_time) = *self.opened_at.lock() {
            if opened_time.elapsed() >= self.cooldown_duration {
                // Allow trial request
                return Ok(());
            }
        }

        Err(RuntimeError::Model(
            "Circuit breaker open: model service unavailable".to_string(),
        ))
    }
}

/// Append `/v1` unless the URL already carries it.
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.contains("/v1") {
        trimmed.to_string()
    } else {
        format!("{}/v1", trimmed)
    }
}

/// Model client speaking the chat completions protocol.
#[derive(Clone)]
pub struct LLMClient {
    base_url: String,
    client: reqwest::Client,
    model: String,
    api_key: Option<String>,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl LLMClient {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, RuntimeError> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(RuntimeError::Config("Model cannot be empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RuntimeError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base_url: normalize_base_url(base_url),
            client,
            model: model.trim().to_string(),
            api_key: None,
            circuit_breaker: Arc::new(CircuitBreaker::new(
                BREAKER_FAILURE_THRESHOLD,
                BREAKER_COOLDOWN,
            )),
        })
    }

    /// Send `Authorization: Bearer <key>` with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = (!key.is_empty()).then_some(key);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn call_once(
        &self,
        messages: &[Message],
        tools: &[Value],
    ) -> Result<ModelResponse, RuntimeError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: messages.iter().map(encode_message).collect(),
            tools: (!tools.is_empty()).then_some(tools),
            tool_choice: (!tools.is_empty()).then_some("auto"),
            temperature: 0.2,
        };

        debug!("model url={} tools_count={}", url, tools.len());

        let mut req_builder = self.client.post(&url).json(&request);
        if let Some(api_key) = &self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                RuntimeError::Model("Network connection failed".to_string())
            } else {
                RuntimeError::Model(format!("HTTP request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(classify_status(status.as_u16(), &error_body));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| RuntimeError::Model(format!("Failed to parse response: {}", e)))?;
        decode_response(body)
    }
}

#[async_trait]
impl ModelClient for LLMClient {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Value],
    ) -> Result<ModelResponse, RuntimeError> {
        let _timer = crate::metrics::MetricTimer::new(crate::metrics::MODEL_REQUEST_LATENCY);

        self.circuit_breaker.should_allow_request()?;

        match self.call_once(messages, tools).await {
            Ok(response) => {
                self.circuit_breaker.record_success();
                Ok(response)
            }
            Err(e) => {
                if e.is_retriable() {
                    self.circuit_breaker.record_failure();
                }
                Err(e)
            }
        }
    }
}

fn classify_status(status: u16, body: &str) -> RuntimeError {
    match status {
        401 | 403 => RuntimeError::ModelRejected(format!(
            "Authentication failed (HTTP {}). Details: {}",
            status, body
        )),
        404 => RuntimeError::ModelRejected(format!("Invalid endpoint (404 Not Found). Details: {}", body)),
        429 => RuntimeError::Model(format!("Rate limit exceeded (429). Details: {}", body)),
        408 | 500..=599 => RuntimeError::Model(format!("Server error: HTTP {}. Details: {}", status, body)),
        _ => RuntimeError::ModelRejected(format!("HTTP error: {}. Details: {}", status, body)),
    }
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn encode_message(msg: &Message) -> Value {
    match msg.role {
        Role::Assistant if !msg.tool_calls.is_empty() => {
            let calls: Vec<Value> = msg
                .tool_calls
                .iter()
                .map(|tc| {
                    json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {"name": tc.name, "arguments": tc.raw_arguments}
                    })
                })
                .collect();
            json!({
                "role": "assistant",
                "content": msg.content.clone().unwrap_or_default(),
                "tool_calls": calls
            })
        }
        Role::Tool => json!({
            "role": "tool",
            "tool_call_id": msg.tool_call_id.clone().unwrap_or_default(),
            "content": msg.content.clone().unwrap_or_default()
        }),
        role => json!({
            "role": role_str(role),
            "content": msg.content.clone().unwrap_or_default()
        }),
    }
}

fn decode_response(body: ChatResponse) -> Result<ModelResponse, RuntimeError> {
    let choice = body
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| RuntimeError::Model("No choices in response".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, tc)| {
            let raw_arguments = match tc.function.arguments {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            ToolCall {
                id: tc.id.unwrap_or_else(|| format!("call_{}", i)),
                name: tc.function.name,
                raw_arguments,
            }
        })
        .collect();

    Ok(ModelResponse {
        content: choice.message.content,
        tool_calls,
    })
}
