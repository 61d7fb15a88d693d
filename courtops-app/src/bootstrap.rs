//! Wiring: collaborators, registry, executor, model client.

use crate::config::Config;
use anyhow::{Context, Result};
use courtops_infra::{
    AuditLog, FileReportGenerator, MarkdownDocsGenerator, PublicDataConnector, SqliteRecordStore,
    Workspace,
};
use courtops_runtime::{LLMClient, ModelClient, Orchestrator};
use courtops_tools::{
    ops_tools, AuditRecorder, Collaborators, RecordStore, ToolExecutor, ToolRegistry,
    TOOL_WHITELIST,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Everything a command needs, built once per process.
pub struct App {
    pub config: Config,
    pub workspace: Workspace,
    pub store: Arc<SqliteRecordStore>,
    pub audit_log: Arc<AuditLog>,
    pub registry: Arc<ToolRegistry>,
    pub executor: Arc<ToolExecutor>,
}

pub fn open_store(config: &Config) -> Result<Arc<SqliteRecordStore>> {
    let path = config.database_path();
    let store = SqliteRecordStore::open(&path)
        .with_context(|| format!("Failed to open record store {}", path.display()))?;
    Ok(Arc::new(store))
}

pub fn open_audit_log(config: &Config) -> Result<Arc<AuditLog>> {
    let path = config.audit_log_path();
    let log = AuditLog::open(&path)
        .with_context(|| format!("Failed to open audit log {}", path.display()))?;
    Ok(Arc::new(log))
}

pub fn build(config: Config) -> Result<App> {
    let workspace = Workspace::new(&config.paths.workspace);
    let store = open_store(&config)?;
    let audit_log = open_audit_log(&config)?;

    let record_store: Arc<dyn RecordStore> = store.clone();
    let collaborators = Collaborators {
        store: record_store.clone(),
        reports: Arc::new(FileReportGenerator::new(
            workspace.clone(),
            record_store,
            audit_log.clone(),
        )),
        docs: Arc::new(MarkdownDocsGenerator::new(workspace.clone())),
        dataset: Arc::new(
            PublicDataConnector::new(workspace.clone()).context("Failed to build dataset client")?,
        ),
    };

    let registry = Arc::new(
        ToolRegistry::from_whitelist(TOOL_WHITELIST, ops_tools(&collaborators))
            .context("Tool whitelist and handlers disagree")?,
    );
    let audit = Arc::new(AuditRecorder::new(audit_log.clone()));
    let executor = Arc::new(ToolExecutor::new(
        registry.clone(),
        audit,
        config.agent.tool_timeout_ms,
    ));
    info!("Registered {} tools", registry.count());

    Ok(App {
        config,
        workspace,
        store,
        audit_log,
        registry,
        executor,
    })
}

pub fn model_client(config: &Config) -> Result<Arc<dyn ModelClient>> {
    let client = LLMClient::new(
        &config.llm.base_url,
        config.llm.model.clone(),
        Duration::from_secs(config.llm.request_timeout_secs),
    )
    .context("Failed to build model client")?
    .with_api_key(config.llm.api_key.clone());
    info!("Model {} at {}", client.model(), client.base_url());
    Ok(Arc::new(client))
}

impl App {
    pub fn orchestrator(&self, model: Arc<dyn ModelClient>) -> Orchestrator {
        Orchestrator::new(model, self.executor.clone(), self.config.orchestrator_config())
    }
}
