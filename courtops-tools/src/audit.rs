//! Audit recording for tool invocations.
//!
//! Every call that reaches the executor produces one [`AuditEntry`]. Arguments
//! are reduced to a short digest and outcomes are truncated so entries stay
//! small. A failing sink never fails the tool call: entries it rejects are
//! parked in a bounded buffer and retried on the next write.

use crate::traits::AuditSink;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::warn;

pub const OUTCOME_SUMMARY_CHARS: usize = 500;
pub const DIGEST_HEX_CHARS: usize = 16;
const DEFAULT_BUFFER_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub user_id: Option<i64>,
    pub tool: String,
    pub args_digest: String,
    pub outcome_summary: String,
    pub timestamp: DateTime<Utc>,
}

pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
    pending: Mutex<VecDeque<AuditEntry>>,
    capacity: usize,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self::with_capacity(sink, DEFAULT_BUFFER_CAPACITY)
    }

    pub fn with_capacity(sink: Arc<dyn AuditSink>, capacity: usize) -> Self {
        Self {
            sink,
            pending: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub async fn record(
        &self,
        user_id: Option<i64>,
        tool: &str,
        args: &Map<String, Value>,
        outcome_summary: &str,
    ) -> AuditEntry {
        let entry = AuditEntry {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            tool: tool.to_string(),
            args_digest: args_digest(args),
            outcome_summary: truncate_chars(outcome_summary, OUTCOME_SUMMARY_CHARS),
            timestamp: Utc::now(),
        };

        self.flush_pending().await;

        if let Err(e) = self.sink.append(&entry).await {
            warn!("Audit sink unavailable, buffering entry for {}: {}", tool, e);
            self.park(entry.clone());
        }

        entry
    }

    /// Entries waiting for the sink to come back.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    async fn flush_pending(&self) {
        let mut queued = std::mem::take(&mut *self.pending.lock());
        while let Some(entry) = queued.pop_front() {
            if self.sink.append(&entry).await.is_err() {
                queued.push_front(entry);
                break;
            }
        }
        if !queued.is_empty() {
            let mut pending = self.pending.lock();
            queued.extend(pending.drain(..));
            *pending = queued;
        }
    }

    fn park(&self, entry: AuditEntry) {
        let mut pending = self.pending.lock();
        if pending.len() >= self.capacity {
            if let Some(dropped) = pending.pop_front() {
                warn!("Audit buffer full, dropping entry {}", dropped.id);
            }
        }
        pending.push_back(entry);
    }
}

/// Stable short hash of the argument mapping. Keys are sorted recursively
/// so the digest does not depend on the order the model emitted them in.
pub fn args_digest(args: &Map<String, Value>) -> String {
    let canonical = canonicalize(&Value::Object(args.clone()));
    let encoded = serde_json::to_string(&canonical).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(encoded.as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    hex[..DIGEST_HEX_CHARS].to_string()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Truncate to at most `max` characters on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollaboratorError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FlakySink {
        down: AtomicBool,
        written: Mutex<Vec<AuditEntry>>,
    }

    #[async_trait]
    impl AuditSink for FlakySink {
        async fn append(&self, entry: &AuditEntry) -> Result<(), CollaboratorError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(CollaboratorError::Storage("disk full".into()));
            }
            self.written.lock().push(entry.clone());
            Ok(())
        }
    }

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_digest_ignores_key_order() {
        let a = map(json!({"ticket_id": 4, "resolution_note": "reset password"}));
        let b = map(json!({"resolution_note": "reset password", "ticket_id": 4}));
        assert_eq!(args_digest(&a), args_digest(&b));
        assert_eq!(args_digest(&a).len(), DIGEST_HEX_CHARS);
        assert_ne!(args_digest(&a), args_digest(&map(json!({"ticket_id": 5}))));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 50), "short");
    }

    #[tokio::test]
    async fn test_entry_never_contains_raw_arguments() {
        let sink = Arc::new(FlakySink {
            down: AtomicBool::new(false),
            written: Mutex::new(Vec::new()),
        });
        let recorder = AuditRecorder::new(sink.clone());
        let args = map(json!({"proposed_change": "secret-ish payload"}));

        let long_outcome = "x".repeat(2_000);
        let entry = recorder.record(Some(7), "create_change_request", &args, &long_outcome).await;

        assert_eq!(entry.user_id, Some(7));
        assert_eq!(entry.outcome_summary.len(), OUTCOME_SUMMARY_CHARS);
        let line = serde_json::to_string(&entry).unwrap();
        assert!(!line.contains("secret-ish payload"));
        assert_eq!(sink.written.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_sink_outage_buffers_then_flushes_in_order() {
        let sink = Arc::new(FlakySink {
            down: AtomicBool::new(true),
            written: Mutex::new(Vec::new()),
        });
        let recorder = AuditRecorder::new(sink.clone());
        let args = Map::new();

        let first = recorder.record(None, "sla_sweep", &args, "ok").await;
        let second = recorder.record(None, "triage_tickets", &args, "ok").await;
        assert_eq!(recorder.pending_len(), 2);

        sink.down.store(false, Ordering::SeqCst);
        let third = recorder.record(None, "generate_audit_report", &args, "ok").await;

        assert_eq!(recorder.pending_len(), 0);
        let ids: Vec<String> = sink.written.lock().iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);
    }

    #[tokio::test]
    async fn test_buffer_is_bounded() {
        let sink = Arc::new(FlakySink {
            down: AtomicBool::new(true),
            written: Mutex::new(Vec::new()),
        });
        let recorder = AuditRecorder::with_capacity(sink, 2);
        for _ in 0..5 {
            recorder.record(None, "sla_sweep", &Map::new(), "ok").await;
        }
        assert_eq!(recorder.pending_len(), 2);
    }
}
