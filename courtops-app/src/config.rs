use anyhow::{bail, Context, Result};
use courtops_runtime::{OrchestratorConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "courtops.yaml";
const MIN_TOOL_MESSAGE_CHARS: usize = 64;

pub const ENV_BASE_URL: &str = "COURTOPS_LLM_BASE_URL";
pub const ENV_MODEL: &str = "COURTOPS_LLM_MODEL";
pub const ENV_API_KEY: &str = "COURTOPS_LLM_API_KEY";
pub const ENV_MAX_TURNS: &str = "COURTOPS_MAX_TURNS";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub agent: AgentConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434/v1/".to_string(),
            model: "qwen3:8b".to_string(),
            api_key: "ollama".to_string(),
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_turns: usize,
    pub tool_message_chars: usize,
    pub tool_timeout_ms: u64,
    pub max_calls_per_tool: Option<usize>,
    pub deadline_secs: Option<u64>,
    pub retry: RetryConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: 45,
            tool_message_chars: 800,
            tool_timeout_ms: 60_000,
            max_calls_per_tool: None,
            deadline_secs: None,
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 250,
        }
    }
}

/// Relative paths resolve against `workspace`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub workspace: PathBuf,
    pub database: PathBuf,
    pub audit_log: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from("."),
            database: PathBuf::from("data/courtops.db"),
            audit_log: PathBuf::from("data/audit/agent_tools.jsonl"),
        }
    }
}

impl Config {
    /// Load `path` if it exists, then apply environment overrides and validate.
    /// A missing file yields the development defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Self::from_yaml(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.llm.model = model;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.llm.api_key = key;
        }
        if let Some(turns) = lookup(ENV_MAX_TURNS) {
            self.agent.max_turns = turns
                .trim()
                .parse()
                .with_context(|| format!("{} must be a positive integer, got {:?}", ENV_MAX_TURNS, turns))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.llm.model.trim().is_empty() {
            bail!("llm.model cannot be empty");
        }
        if self.llm.base_url.trim().is_empty() {
            bail!("llm.base_url cannot be empty");
        }
        if self.agent.max_turns == 0 {
            bail!("agent.max_turns must be at least 1");
        }
        if self.agent.retry.max_attempts == 0 {
            bail!("agent.retry.max_attempts must be at least 1");
        }
        if self.agent.tool_message_chars < MIN_TOOL_MESSAGE_CHARS {
            bail!(
                "agent.tool_message_chars must be at least {}",
                MIN_TOOL_MESSAGE_CHARS
            );
        }
        if self.agent.max_calls_per_tool == Some(0) {
            bail!("agent.max_calls_per_tool must be at least 1 when set");
        }
        Ok(())
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.paths.workspace.join(path)
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.resolve(&self.paths.database)
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.resolve(&self.paths.audit_log)
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            max_turns: self.agent.max_turns,
            tool_message_chars: self.agent.tool_message_chars,
            max_calls_per_tool: self.agent.max_calls_per_tool,
            deadline: self.agent.deadline_secs.map(Duration::from_secs),
            retry: RetryPolicy::new(
                self.agent.retry.max_attempts,
                Duration::from_millis(self.agent.retry.base_delay_ms),
            ),
        }
    }
}
