use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub user_id: Option<i64>,
    pub call_ref: String,
    pub timeout_ms: u64,
    pub now: DateTime<Utc>,
}

impl ExecutionContext {
    pub fn new(user_id: Option<i64>, timeout_ms: u64) -> Self {
        Self {
            user_id,
            call_ref: uuid::Uuid::new_v4().to_string(),
            timeout_ms,
            now: Utc::now(),
        }
    }

    /// Pin the clock handlers see.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// Current reporting period, `YYYY-MM`.
    pub fn current_period(&self) -> String {
        self.now.format("%Y-%m").to_string()
    }
}
