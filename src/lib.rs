//! Normativa-Scraper: a polite downloader for Chilean tax documents
//!
//! This crate fetches publicly published tax laws (LeyChile) and tax-authority
//! documents (SII resolutions, circulars and XML schemas), saves them under a
//! local output root and writes one JSON report per invocation.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod output;
pub mod runs;
pub mod shutdown;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Normativa-Scraper operations
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("No index published at {url}")]
    IndexNotFound { url: String },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Report serialization error: {0}")]
    Report(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl ScraperError {
    /// Wraps an IO error with the path it happened at
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Normativa-Scraper operations
pub type Result<T> = std::result::Result<T, ScraperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{
    CrawlResult, CrawlTarget, DocumentLink, DownloadOutcome, DownloadStatus, Downloader,
    IndexCrawler, IndexStatus, LinkFilters,
};
pub use output::{CategoryKey, ReportBuilder, RunReport};
