//! Index page crawling
//!
//! One `crawl` call handles one index page: fetch it, extract the document
//! links, derive a filename for each and hand it to the downloader. Whatever
//! goes wrong is reported in the returned `CrawlResult`; sibling categories
//! and years are never affected.

use crate::crawler::throttle::RateLimiter;
use crate::crawler::{
    extract_links, sanitize_filename, DownloadOutcome, Downloader, LinkFilters,
    Transport,
};
use crate::output::CategoryKey;
use crate::shutdown::Shutdown;
use crate::url::host_key;
use crate::ScraperError;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// What happened to the index page itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexStatus {
    /// Fetched and parsed; outcomes may still be empty
    Fetched,

    /// The index answered 404 (usually a year not yet published)
    NotFound,

    /// The index could not be fetched
    Failed(String),

    /// Stopped by a shutdown request before every link was processed
    Interrupted,
}

/// One index page to crawl
#[derive(Debug, Clone)]
pub struct CrawlTarget {
    pub index_url: Url,

    /// Report key, e.g. `resoluciones_2024`
    pub category: CategoryKey,

    /// Prefix for synthesized filenames, e.g. `resolucion`
    pub file_prefix: String,

    /// Directory documents are saved into
    pub destination: PathBuf,

    pub filters: LinkFilters,

    /// Extension a basename must carry to be kept as the filename
    pub expected_extension: String,
}

/// Result of crawling one index page
#[derive(Debug, Clone)]
pub struct CrawlResult {
    pub source_index_url: Url,
    pub category: CategoryKey,
    pub index_status: IndexStatus,

    /// One outcome per discovered link, in discovery order
    pub outcomes: Vec<DownloadOutcome>,
}

impl CrawlResult {
    fn empty(target: &CrawlTarget, index_status: IndexStatus) -> Self {
        Self {
            source_index_url: target.index_url.clone(),
            category: target.category.clone(),
            index_status,
            outcomes: Vec::new(),
        }
    }

    /// Documents now on disk (downloaded or already present)
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status().is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Crawls index pages and downloads what they link to
pub struct IndexCrawler {
    transport: Arc<dyn Transport>,
    downloader: Downloader,
    limiter: Arc<dyn RateLimiter>,
    site_origin: Url,
    shutdown: Option<Shutdown>,
}

impl IndexCrawler {
    /// Creates a crawler
    ///
    /// `site_origin` is what root-relative hrefs (`/…`) resolve against. The
    /// downloader should share `limiter` so index and document requests to
    /// the same host are spaced together.
    pub fn new(
        transport: Arc<dyn Transport>,
        downloader: Downloader,
        limiter: Arc<dyn RateLimiter>,
        site_origin: Url,
    ) -> Self {
        Self {
            transport,
            downloader,
            limiter,
            site_origin,
            shutdown: None,
        }
    }

    /// Stops between documents once `shutdown` is triggered
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn interrupted(&self) -> bool {
        self.shutdown.as_ref().is_some_and(Shutdown::is_triggered)
    }

    /// Crawls one index page
    pub async fn crawl(&self, target: &CrawlTarget) -> CrawlResult {
        if self.interrupted() {
            return CrawlResult::empty(target, IndexStatus::Interrupted);
        }

        tracing::info!("Processing {}: {}", target.category, target.index_url);

        let (page_url, body) = match self.fetch_index(&target.index_url).await {
            Ok(page) => page,
            Err(status) => return CrawlResult::empty(target, status),
        };

        let links = extract_links(&body, &page_url, &self.site_origin, &target.filters);
        if links.is_empty() {
            tracing::info!("No documents found on {}", page_url);
            return CrawlResult::empty(target, IndexStatus::Fetched);
        }

        tracing::info!("Found {} documents for {}", links.len(), target.category);
        for link in links.iter().take(3) {
            tracing::debug!("  {} -> {}", link.anchor_text, link.url);
        }

        let mut result = CrawlResult::empty(target, IndexStatus::Fetched);
        for link in &links {
            if self.interrupted() {
                tracing::warn!(
                    "Interrupted after {} of {} documents in {}",
                    result.outcomes.len(),
                    links.len(),
                    target.category
                );
                result.index_status = IndexStatus::Interrupted;
                break;
            }

            let filename = sanitize_filename(link, &target.file_prefix, &target.expected_extension);
            let destination = target.destination.join(filename);
            result
                .outcomes
                .push(self.downloader.download(link, &destination).await);
        }

        result
    }

    /// Fetches an index page, returning its final URL and body
    async fn fetch_index(&self, index_url: &Url) -> Result<(Url, Vec<u8>), IndexStatus> {
        self.limiter.wait(&host_key(index_url)).await;

        let response = match self.transport.get(index_url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Error fetching index {}: {}", index_url, e);
                return Err(IndexStatus::Failed(e.to_string()));
            }
        };

        if response.is_not_found() {
            let e = ScraperError::IndexNotFound {
                url: index_url.to_string(),
            };
            tracing::warn!("{}", e);
            return Err(IndexStatus::NotFound);
        }

        if !response.is_success() {
            let e = ScraperError::HttpStatus {
                url: index_url.to_string(),
                status: response.status,
            };
            tracing::error!("Error fetching index: {}", e);
            return Err(IndexStatus::Failed(e.to_string()));
        }

        Ok((response.final_url, response.body))
    }
}
