//! CourtOps agent runtime.
//!
//! Drives a language model through a bounded turn loop over the whitelisted
//! court operations tools and aggregates what it did into a [`RunResult`].

pub mod aggregator;
pub mod artifacts;
pub mod interfaces;
pub mod llm_client;
pub mod metrics;
pub mod orchestrator;
pub mod presets;
pub mod prompt;
pub mod retry;
pub mod types;

pub use aggregator::{ActionRecord, RunResult, StopReason};
pub use interfaces::{ModelClient, RuntimeError};
pub use llm_client::LLMClient;
pub use orchestrator::{Orchestrator, OrchestratorConfig, RunRequest};
pub use presets::{find_preset, Preset, PRESETS};
pub use retry::RetryPolicy;
pub use types::{Message, ModelResponse, Role, ToolCall};
