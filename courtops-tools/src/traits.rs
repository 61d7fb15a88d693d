use crate::audit::AuditEntry;
use crate::error::CollaboratorError;
use crate::records::{
    Case, ChangeRequest, Device, NewChangeRequest, NewPatch, Patch, Ticket,
};
use async_trait::async_trait;

/// Record store holding tickets, devices, patches, change requests and cases.
pub trait RecordStore: Send + Sync {
    /// Open and in-progress tickets, newest first.
    fn open_tickets(&self) -> Result<Vec<Ticket>, CollaboratorError>;
    fn all_tickets(&self) -> Result<Vec<Ticket>, CollaboratorError>;
    fn ticket(&self, id: i64) -> Result<Option<Ticket>, CollaboratorError>;
    fn update_ticket(&self, ticket: &Ticket) -> Result<(), CollaboratorError>;

    fn devices(&self) -> Result<Vec<Device>, CollaboratorError>;

    fn create_patch(&self, patch: NewPatch) -> Result<Patch, CollaboratorError>;
    fn patch(&self, id: i64) -> Result<Option<Patch>, CollaboratorError>;
    fn update_patch(&self, patch: &Patch) -> Result<(), CollaboratorError>;
    fn patches(&self) -> Result<Vec<Patch>, CollaboratorError>;

    fn create_change_request(
        &self,
        request: NewChangeRequest,
    ) -> Result<ChangeRequest, CollaboratorError>;
    fn change_request(&self, id: i64) -> Result<Option<ChangeRequest>, CollaboratorError>;

    fn cases(&self) -> Result<Vec<Case>, CollaboratorError>;
}

/// Writes report files under the reports root. Returned paths are relative
/// to the workspace (`reports/<period>/...`).
pub trait ReportGenerator: Send + Sync {
    fn monthly_operations(&self, period: &str) -> Result<Vec<String>, CollaboratorError>;
    fn revenue_at_risk(&self, period: &str) -> Result<String, CollaboratorError>;
    fn audit_report(&self, period: &str) -> Result<String, CollaboratorError>;
}

/// Writes the functional spec, SOP update and release notes for a change
/// request. Returned paths are relative to the workspace (`docs/generated/...`).
pub trait DocsGenerator: Send + Sync {
    fn change_request_docs(
        &self,
        request: &ChangeRequest,
    ) -> Result<Vec<String>, CollaboratorError>;
}

/// Public dataset downloader.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Force-refresh the cached copy of `source_id` and return its path.
    async fn refresh(&self, source_id: &str) -> Result<String, CollaboratorError>;
}

/// Persistent destination for audit entries.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, entry: &AuditEntry) -> Result<(), CollaboratorError>;
}
