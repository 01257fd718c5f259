//! Document downloader
//!
//! Fetches one document per call through the shared transport and writes it
//! to disk. Every failure is turned into a `DownloadOutcome`; nothing here
//! aborts a batch.

use crate::crawler::throttle::RateLimiter;
use crate::crawler::{DocumentLink, Transport};
use crate::url::host_key;
use crate::ScraperError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Why a download was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A file already exists at the destination; contents are never compared
    AlreadyExists,
}

/// Result of one download attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    Downloaded,
    Skipped(SkipReason),
    Failed(String),
}

impl DownloadStatus {
    /// True if the document is on disk after the attempt
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Downloaded | Self::Skipped(_))
    }
}

/// Record of one attempted download
///
/// Fields are read-only once the outcome is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    link: DocumentLink,
    local_path: Option<PathBuf>,
    status: DownloadStatus,
}

impl DownloadOutcome {
    pub fn downloaded(link: DocumentLink, path: PathBuf) -> Self {
        Self {
            link,
            local_path: Some(path),
            status: DownloadStatus::Downloaded,
        }
    }

    pub fn skipped(link: DocumentLink, path: PathBuf, reason: SkipReason) -> Self {
        Self {
            link,
            local_path: Some(path),
            status: DownloadStatus::Skipped(reason),
        }
    }

    pub fn failed(link: DocumentLink, reason: impl Into<String>) -> Self {
        Self {
            link,
            local_path: None,
            status: DownloadStatus::Failed(reason.into()),
        }
    }

    pub fn link(&self) -> &DocumentLink {
        &self.link
    }

    /// Path of the document on disk; None if the download failed
    pub fn local_path(&self) -> Option<&Path> {
        self.local_path.as_deref()
    }

    pub fn status(&self) -> &DownloadStatus {
        &self.status
    }

    /// Failure reason, if any
    pub fn failure(&self) -> Option<&str> {
        match &self.status {
            DownloadStatus::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Downloads documents through a shared transport
#[derive(Clone)]
pub struct Downloader {
    transport: Arc<dyn Transport>,
    limiter: Arc<dyn RateLimiter>,
}

impl Downloader {
    pub fn new(transport: Arc<dyn Transport>, limiter: Arc<dyn RateLimiter>) -> Self {
        Self { transport, limiter }
    }

    /// Downloads `link` to `destination`
    ///
    /// # Behaviour
    ///
    /// | Condition | Outcome |
    /// |-----------|---------|
    /// | File exists at destination | `Skipped(AlreadyExists)`, no request |
    /// | 2xx response | `Downloaded`, body written atomically |
    /// | Non-2xx response | `Failed("HTTP <code> ...")` |
    /// | Transport, timeout or write error | `Failed(reason)` |
    pub async fn download(&self, link: &DocumentLink, destination: &Path) -> DownloadOutcome {
        if destination.exists() {
            tracing::info!("Already exists: {}", destination.display());
            return DownloadOutcome::skipped(
                link.clone(),
                destination.to_path_buf(),
                SkipReason::AlreadyExists,
            );
        }

        match self.fetch_to(link, destination).await {
            Ok(bytes) => {
                tracing::info!("✓ Downloaded: {} ({} bytes)", destination.display(), bytes);
                DownloadOutcome::downloaded(link.clone(), destination.to_path_buf())
            }
            Err(e) => {
                tracing::error!("Error downloading {}: {}", link.url, e);
                DownloadOutcome::failed(link.clone(), e.to_string())
            }
        }
    }

    async fn fetch_to(&self, link: &DocumentLink, destination: &Path) -> Result<usize, ScraperError> {
        self.limiter.wait(&host_key(&link.url)).await;

        let response = self.transport.get(&link.url).await?;
        if !response.is_success() {
            return Err(ScraperError::HttpStatus {
                url: link.url.to_string(),
                status: response.status,
            });
        }

        write_atomic(destination, &response.body).await?;
        Ok(response.body.len())
    }
}

/// Writes `bytes` to `<path>.part` and renames it over `path`
///
/// A reader never observes a partially written document. The parent directory
/// is created if missing.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ScraperError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ScraperError::filesystem(parent, e))?;
    }

    let partial = partial_path(path);
    if let Err(e) = tokio::fs::write(&partial, bytes).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(ScraperError::filesystem(&partial, e));
    }

    if let Err(e) = tokio::fs::rename(&partial, path).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(ScraperError::filesystem(path, e));
    }

    Ok(())
}

/// `<path>.part`
fn partial_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
