use crate::infra::workspace::{Workspace, DOCS_DIR};
use courtops_tools::records::ChangeRequest;
use courtops_tools::{CollaboratorError, DocsGenerator};
use tracing::info;

/// Writes the markdown document set for a change request under `docs/generated/`.
pub struct MarkdownDocsGenerator {
    workspace: Workspace,
}

impl MarkdownDocsGenerator {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

fn functional_spec(cr: &ChangeRequest) -> String {
    format!(
        "# Functional Specification: {}\n\n\
         **Requested by:** {}\n\n\
         ## Current Process\n{}\n\n\
         ## Proposed Change\n{}\n\n\
         ## Impact Analysis\n\n\
         - Users: {}\n\
         - Data: {}\n\
         - Security: {}\n",
        cr.title,
        cr.requested_by,
        cr.current_process,
        cr.proposed_change,
        cr.impact_users,
        cr.impact_data,
        cr.impact_security
    )
}

fn sop_update(cr: &ChangeRequest) -> String {
    format!(
        "# SOP Update: {}\n\n\
         ## Overview\nThis document outlines updates to standard operating procedures \
         required to support the approved change request.\n\n\
         ## New / Updated Steps\n\n{}\n",
        cr.title, cr.proposed_change
    )
}

fn release_notes(cr: &ChangeRequest) -> String {
    format!(
        "# Release Notes: {}\n\n\
         ## Summary\n{}\n\n\
         ## Impacted Users\n{}\n\n\
         ## Deployment Notes\n- Coordinate with court operations and IT support.\n",
        cr.title, cr.proposed_change, cr.impact_users
    )
}

impl DocsGenerator for MarkdownDocsGenerator {
    fn change_request_docs(&self, cr: &ChangeRequest) -> Result<Vec<String>, CollaboratorError> {
        let dir = self.workspace.ensure_dir(DOCS_DIR)?;
        let prefix = format!("cr-{:04}", cr.id);

        let documents = [
            ("functional-spec", functional_spec(cr)),
            ("sop-update", sop_update(cr)),
            ("release-notes", release_notes(cr)),
        ];

        let mut paths = Vec::with_capacity(documents.len());
        for (kind, body) in documents {
            let file_name = format!("{}-{}.md", prefix, kind);
            std::fs::write(dir.join(&file_name), body)?;
            paths.push(format!("{}/{}", DOCS_DIR, file_name));
        }

        info!("Generated {} documents for change request {}", paths.len(), cr.id);
        Ok(paths)
    }
}
