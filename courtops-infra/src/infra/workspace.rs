use std::io;
use std::path::{Path, PathBuf};

pub const REPORTS_DIR: &str = "reports";
pub const DOCS_DIR: &str = "docs/generated";
pub const CACHE_DIR: &str = "data/cache";

/// Root directory generated artifacts are written under. Paths handed back to
/// tools are relative to this root so they match the artifact markers.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Create `relative` (and parents) under the root.
    pub fn ensure_dir(&self, relative: &str) -> io::Result<PathBuf> {
        let dir = self.resolve(relative);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn report_dir(&self, period: &str) -> io::Result<PathBuf> {
        self.ensure_dir(&format!("{}/{}", REPORTS_DIR, period))
    }
}
