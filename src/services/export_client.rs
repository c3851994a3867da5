use chrono::{DateTime, Utc};
use reqwest::{header, Client};
use secrecy::{ExposeSecret, Secret};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::models::export_request::{ExportFormat, ExportRequest};
use crate::services::registry_export::export_filename;

pub const REGISTRY_EXPORT_PATH: &str = "/api/export/registry-export";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    /// Transport and server failures are deliberately collapsed into one case
    #[error("Export failed. Please check the date range and try again.")]
    ExportFailed,

    #[error("Failed to save export: {0}")]
    Save(#[from] std::io::Error),
}

/// A finished export, held in memory until saved.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
    pub generated_at: DateTime<Utc>,
}

impl ExportedFile {
    pub fn filename(&self) -> String {
        export_filename(self.format, self.generated_at)
    }

    /// Writes the file into `dir` and returns its full path.
    pub async fn save_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(self.filename());
        tokio::fs::write(&path, &self.bytes).await?;

        tracing::info!(path = %path.display(), bytes = self.bytes.len(), "Saved export");

        Ok(path)
    }
}

fn export_endpoint(base_url: &Url) -> Result<Url, url::ParseError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(REGISTRY_EXPORT_PATH.trim_start_matches('/'))
}

/// Client side of the export desk: posts a request to the registry export
/// endpoint and downloads the generated file.
#[derive(Clone)]
pub struct ExportClient {
    client: Client,
    endpoint: Url,
    admin_token: Secret<String>,
}

impl ExportClient {
    /// `base_url` may carry a path prefix (`https://shop.example/admin`); the
    /// export path is resolved beneath it.
    pub fn new(base_url: &Url, admin_token: Secret<String>) -> Result<Self, url::ParseError> {
        let endpoint = export_endpoint(base_url)?;

        Ok(Self {
            client: Client::new(),
            endpoint,
            admin_token,
        })
    }

    /// Runs the export. Every failure surfaces as `ExportFailed`; the
    /// underlying cause is only logged.
    #[tracing::instrument(skip(self, request), fields(format = ?request.format))]
    pub async fn execute(&self, request: &ExportRequest) -> Result<ExportedFile, ExportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.admin_token.expose_secret())
            .timeout(REQUEST_TIMEOUT)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Export request failed");
                ExportError::ExportFailed
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(
                status = %status,
                error = %error_text,
                "Export endpoint returned an error"
            );
            return Err(ExportError::ExportFailed);
        }

        let format = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(ExportFormat::from_content_type)
            .unwrap_or(request.format);

        let bytes = response.bytes().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to read export body");
            ExportError::ExportFailed
        })?;

        tracing::info!(?format, bytes = bytes.len(), "Export downloaded");

        Ok(ExportedFile {
            format,
            bytes: bytes.to_vec(),
            generated_at: Utc::now(),
        })
    }
}
