pub mod arguments;
pub mod audit;
pub mod error;
pub mod execution_context;
pub mod executor;
pub mod records;
pub mod registry;
pub mod tools;
pub mod traits;

pub use arguments::{parse_arguments, ToolArgs};
pub use audit::{AuditEntry, AuditRecorder};
pub use error::{CollaboratorError, RegistryError, ToolError};
pub use execution_context::ExecutionContext;
pub use executor::ToolExecutor;
pub use registry::ToolRegistry;
pub use tools::{blocking, ops_tools, Collaborators, Tool, ToolResult, ToolSpec, TOOL_WHITELIST};
pub use traits::{AuditSink, DatasetSource, DocsGenerator, RecordStore, ReportGenerator};
