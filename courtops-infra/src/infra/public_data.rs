use crate::infra::workspace::{Workspace, CACHE_DIR};
use async_trait::async_trait;
use chrono::Utc;
use courtops_tools::{CollaboratorError, DatasetSource};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::info;

pub const SOMERVILLE_CITATIONS_URL: &str =
    "https://data.somervillema.gov/api/views/3mqx-eye9/rows.csv?accessType=DOWNLOAD";
const CITATIONS_FILENAME: &str = "somerville_traffic_citations.csv";
const METADATA_FILENAME: &str = "somerville_traffic_citations.meta";
const DOWNLOAD_TIMEOUT_SECS: u64 = 60;

/// Downloads the Somerville traffic citations dataset into `data/cache/`.
pub struct PublicDataConnector {
    workspace: Workspace,
    client: reqwest::Client,
    url: String,
}

impl PublicDataConnector {
    pub fn new(workspace: Workspace) -> Result<Self, CollaboratorError> {
        Self::with_url(workspace, SOMERVILLE_CITATIONS_URL)
    }

    pub fn with_url(workspace: Workspace, url: impl Into<String>) -> Result<Self, CollaboratorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .build()
            .map_err(|e| CollaboratorError::Download(e.to_string()))?;
        Ok(Self {
            workspace,
            client,
            url: url.into(),
        })
    }

    fn cached_paths(&self) -> Result<(PathBuf, PathBuf), CollaboratorError> {
        let dir = self.workspace.ensure_dir(CACHE_DIR)?;
        Ok((dir.join(CITATIONS_FILENAME), dir.join(METADATA_FILENAME)))
    }

    /// Return the cached dataset, downloading it when absent or when `force` is set.
    pub async fn download(&self, force: bool) -> Result<String, CollaboratorError> {
        let (data_path, meta_path) = self.cached_paths()?;
        let relative = format!("{}/{}", CACHE_DIR, CITATIONS_FILENAME);

        if data_path.exists() && !force {
            return Ok(relative);
        }

        let mut resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CollaboratorError::Download(e.to_string()))?;

        let partial = data_path.with_extension("csv.part");
        let mut file = tokio::fs::File::create(&partial).await?;
        let mut bytes = 0usize;
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| CollaboratorError::Download(e.to_string()))?
        {
            bytes += chunk.len();
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&partial, &data_path).await?;

        let meta = [
            ("source", self.url.clone()),
            ("downloaded_at_utc", Utc::now().to_rfc3339()),
            (
                "description",
                "Somerville, MA Police Data: Traffic Citations (public open data).".to_string(),
            ),
            (
                "license",
                "ODbL 1.0 (see Somerville open data portal).".to_string(),
            ),
        ];
        let body: String = meta
            .iter()
            .map(|(k, v)| format!("{},\"{}\"\n", k, v.replace('"', "\"\"")))
            .collect();
        tokio::fs::write(&meta_path, body).await?;

        info!("Downloaded {} bytes to {}", bytes, relative);
        Ok(relative)
    }
}

#[async_trait]
impl DatasetSource for PublicDataConnector {
    async fn refresh(&self, _source_id: &str) -> Result<String, CollaboratorError> {
        self.download(true).await
    }
}
