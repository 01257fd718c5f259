//! SII run: per-year resoluciones and circulares, then XML schemas

use crate::config::Config;
use crate::crawler::{
    CrawlResult, CrawlTarget, Downloader, IndexCrawler, IndexStatus, LinkFilters, RateLimiter,
    Transport,
};
use crate::output::{persist_json, report_path, CategoryKey, ReportBuilder, RunReport, SiiReport};
use crate::shutdown::Shutdown;
use crate::ScraperError;
use chrono::{Datelike, Local};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Report group for the schema archives
pub const SCHEMAS_GROUP: &str = "schemas";

/// Everything an SII run produced
#[derive(Debug, Clone)]
pub struct SiiRunOutcome {
    pub report: RunReport,
    pub view: SiiReport,
    pub results: Vec<CrawlResult>,

    /// Where the JSON report was written
    pub report_path: PathBuf,
}

/// Builds the ordered list of index pages an SII run visits
///
/// Each category is crawled for every year of the window, oldest first, before
/// moving on to the next category. The schema page comes last when enabled.
pub fn plan(config: &Config, current_year: i32) -> Result<Vec<CrawlTarget>, ScraperError> {
    let mut targets = Vec::new();

    for category in &config.sii.categories {
        for year in config.sii.years(current_year) {
            targets.push(CrawlTarget {
                index_url: Url::parse(&category.index_url(year))?,
                category: CategoryKey::yearly(&category.name, year),
                file_prefix: category.file_prefix.clone(),
                destination: config
                    .output
                    .resolve(&category.name)
                    .join(year.to_string()),
                filters: LinkFilters::from(&category.filters),
                expected_extension: category.filters.expected_extension.clone(),
            });
        }
    }

    let schemas = &config.sii.schemas;
    if schemas.enabled {
        targets.push(CrawlTarget {
            index_url: Url::parse(&schemas.index_url)?,
            category: CategoryKey::new(SCHEMAS_GROUP, None),
            file_prefix: schemas.file_prefix.clone(),
            destination: config.output.resolve(&schemas.destination),
            filters: LinkFilters::from(&schemas.filters),
            expected_extension: schemas.filters.expected_extension.clone(),
        });
    }

    Ok(targets)
}

/// Crawls the SII normative index pages and writes `reporte_sii_*.json`
pub struct SiiRun {
    config: Config,
    transport: Arc<dyn Transport>,
    limiter: Arc<dyn RateLimiter>,
    shutdown: Shutdown,
    current_year: i32,
}

impl SiiRun {
    pub fn new(config: Config, transport: Arc<dyn Transport>, limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            config,
            transport,
            limiter,
            shutdown: Shutdown::new(),
            current_year: Local::now().year(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Anchors the year window on `year` instead of the current year
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    /// Runs every planned crawl and persists the report
    ///
    /// Per-document and per-index failures end up in the report. Only an
    /// invalid plan or an unwritable report is an error.
    pub async fn execute(self) -> Result<SiiRunOutcome, ScraperError> {
        tracing::info!("Starting SII normative download");

        let targets = plan(&self.config, self.current_year)?;
        let origin = Url::parse(&self.config.sii.base_origin)?;
        let downloader = Downloader::new(self.transport.clone(), self.limiter.clone());
        let crawler = IndexCrawler::new(self.transport.clone(), downloader, self.limiter.clone(), origin)
            .with_shutdown(self.shutdown.clone());

        let mut builder = ReportBuilder::new("sii");
        let mut results = Vec::with_capacity(targets.len());

        for target in &targets {
            if self.shutdown.is_triggered() {
                tracing::warn!("Interrupted, skipping remaining categories");
                builder.mark_interrupted();
                break;
            }

            let result = crawler.crawl(target).await;
            if result.index_status == IndexStatus::Fetched && !result.is_empty() {
                tracing::info!(
                    "{}: {}/{} downloaded",
                    result.category,
                    result.succeeded(),
                    result.len()
                );
            }
            builder.record_crawl(&result);
            results.push(result);
        }

        let report = builder.finalize();
        let groups = self.config.sii.categories.iter().map(|c| c.name.as_str());
        let view = SiiReport::new(&report, groups);
        let path = report_path(&self.config.output.data_path(), "sii", &Local::now());
        persist_json(&view, &path)?;

        tracing::info!("SII download finished. Report: {}", path.display());

        Ok(SiiRunOutcome {
            report,
            view,
            results,
            report_path: path,
        })
    }
}
