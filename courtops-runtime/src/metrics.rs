//! Metrics instrumentation for runtime observability.

use std::time::Instant;

pub const MODEL_REQUEST_LATENCY: &str = "model_request_latency";
pub const TOOL_EXECUTION_LATENCY: &str = "tool_execution_latency";
pub const RUN_DURATION: &str = "run_duration";

/// Record model request latency.
pub fn record_model_latency(duration_ms: f64) {
    metrics::histogram!("model_request_latency", duration_ms);
}

/// Record tool execution latency.
pub fn record_tool_latency(duration_ms: f64) {
    metrics::histogram!("tool_execution_latency", duration_ms);
}

/// Record run duration.
pub fn record_run_duration(duration_ms: f64) {
    metrics::histogram!("run_duration", duration_ms);
}

/// Count one dispatched tool call by outcome (`ok`, `failed`, `dry_run`).
pub fn record_tool_call(tool: &str, outcome: &'static str) {
    metrics::counter!("tool_calls_total", 1, "tool" => tool.to_string(), "outcome" => outcome);
}

pub fn increment_completion_nudges() {
    metrics::counter!("completion_nudges_total", 1);
}

pub fn increment_model_retries() {
    metrics::counter!("model_retries_total", 1);
}

/// RAII timer for automatic metric recording.
pub struct MetricTimer {
    start: Instant,
    metric_name: &'static str,
}

impl MetricTimer {
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }
}

impl Drop for MetricTimer {
    fn drop(&mut self) {
        let duration_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        match self.metric_name {
            MODEL_REQUEST_LATENCY => record_model_latency(duration_ms),
            TOOL_EXECUTION_LATENCY => record_tool_latency(duration_ms),
            RUN_DURATION => record_run_duration(duration_ms),
            _ => {}
        }
    }
}
