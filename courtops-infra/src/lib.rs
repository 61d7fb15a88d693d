pub mod infra;

pub use infra::audit_log::{AuditLog, AuditLogError};
pub use infra::docs_generator::MarkdownDocsGenerator;
pub use infra::public_data::PublicDataConnector;
pub use infra::record_store::{RecordStoreError, SqliteRecordStore};
pub use infra::reporting::FileReportGenerator;
pub use infra::workspace::Workspace;
