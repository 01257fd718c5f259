//! Crawler module for index pages and document downloads
//!
//! This module contains the reusable core shared by both invocation kinds:
//! - HTTP transport with bounded timeouts
//! - HTML link extraction and filename derivation
//! - Per-host request pacing
//! - Document download and index page crawling

mod downloader;
mod extractor;
mod fetcher;
mod index;
mod sanitize;
pub mod throttle;

#[cfg(test)]
pub(crate) mod testing;

pub use downloader::{write_atomic, DownloadOutcome, DownloadStatus, Downloader, SkipReason};
pub use extractor::{decode_html, extract_links, find_primary_pdf_link, DocumentLink, LinkFilters};
pub use fetcher::{build_http_client, HttpResponse, HttpTransport, Transport};
pub use index::{CrawlResult, CrawlTarget, IndexCrawler, IndexStatus};
pub use sanitize::{law_filename, replace_hostile, sanitize_filename, slugify, MAX_SLUG_CHARS};
pub use throttle::{NoDelay, PerHostDelay, RateLimiter};
