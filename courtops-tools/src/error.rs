use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not whitelisted: {0}")]
    NotWhitelisted(String),

    /// Business-rule rejection raised by a handler ("Ticket not found",
    /// "Invalid status: bogus"). Displayed verbatim.
    #[error("{0}")]
    Rejected(String),

    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Operation timed out")]
    Timeout,

    #[error("Internal error")]
    Internal,
}

impl ToolError {
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }
}

/// Failures raised by the record store, report writers and dataset source.
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<CollaboratorError> for ToolError {
    fn from(err: CollaboratorError) -> Self {
        ToolError::ExecutionFailed(err.to_string())
    }
}

/// Startup mismatch between the whitelist and the registered handlers.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Whitelisted tool has no handler: {0}")]
    MissingHandler(String),

    #[error("Handler registered for tool outside the whitelist: {0}")]
    UnlistedHandler(String),

    #[error("Tool registered twice: {0}")]
    DuplicateTool(String),
}
