//! Abstract interfaces for runtime dependencies.

use crate::types::{Message, ModelResponse};
use async_trait::async_trait;
use thiserror::Error;

/// Runtime errors.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Model unavailable after {attempts} attempt(s): {last_error}")]
    ModelUnavailable { attempts: u32, last_error: String },

    #[error("Model error: {0}")]
    Model(String),

    #[error("Model rejected request: {0}")]
    ModelRejected(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RuntimeError {
    /// Transport and protocol faults are worth another attempt; rejections
    /// and local errors are not.
    pub fn is_retriable(&self) -> bool {
        matches!(self, RuntimeError::Model(_))
    }
}

/// Language model collaborator. One call per turn.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send the full transcript and tool schemas (OpenAI function format).
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[serde_json::Value],
    ) -> Result<ModelResponse, RuntimeError>;
}
