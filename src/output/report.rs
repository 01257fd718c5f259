//! Run report accumulation and persistence
//!
//! A `ReportBuilder` is created when an invocation starts and fed one
//! `CrawlResult` (or batch of outcomes) at a time. `finalize` freezes it into a
//! `RunReport`; `snapshot` does the same for partial data without consuming
//! the builder.

use crate::crawler::{CrawlResult, DownloadOutcome, IndexStatus};
use crate::ScraperError;
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifies a report bucket: a document group and, optionally, a period
///
/// Displayed as `group_period` (`resoluciones_2024`) or just `group`
/// (`schemas`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryKey {
    pub group: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

impl CategoryKey {
    pub fn new(group: impl Into<String>, period: Option<&str>) -> Self {
        Self {
            group: group.into(),
            period: period.map(str::to_string),
        }
    }

    /// Key for a per-year category
    pub fn yearly(group: impl Into<String>, year: i32) -> Self {
        Self {
            group: group.into(),
            period: Some(year.to_string()),
        }
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.period {
            Some(period) => write!(f, "{}_{}", self.group, period),
            None => write!(f, "{}", self.group),
        }
    }
}

/// Discovered document count for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    #[serde(flatten)]
    pub category: CategoryKey,
    pub count: usize,
}

/// Aggregate document counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Documents discovered
    pub total: usize,

    /// Downloaded or already present
    pub succeeded: usize,

    pub failed: usize,
}

/// A document or index that could not be retrieved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub category: String,
    pub url: String,
    pub reason: String,
}

/// Finished report for one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Invocation kind, `sii` or `leyes`
    pub kind: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,

    /// Per-category counts in the order categories were first recorded
    pub categories: Vec<CategoryCount>,
    pub totals: Totals,
    pub failures: Vec<FailureRecord>,

    /// True if the run was stopped before completing
    pub interrupted: bool,
}

impl RunReport {
    /// Count recorded for a category, 0 if never recorded
    pub fn count(&self, category: &CategoryKey) -> usize {
        self.categories
            .iter()
            .find(|c| &c.category == category)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    /// Counts keyed by display name
    pub fn per_category_counts(&self) -> IndexMap<String, usize> {
        self.categories
            .iter()
            .map(|c| (c.category.to_string(), c.count))
            .collect()
    }

    /// Writes the report as pretty JSON, atomically
    pub fn persist(&self, path: &Path) -> Result<(), ScraperError> {
        persist_json(self, path)
    }

    /// Reads a report written by `persist`
    pub fn load(path: &Path) -> Result<Self, ScraperError> {
        let content = std::fs::read_to_string(path).map_err(|e| ScraperError::filesystem(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Accumulates a `RunReport` during an invocation
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    kind: String,
    started_at: DateTime<Local>,
    counts: IndexMap<CategoryKey, usize>,
    totals: Totals,
    failures: Vec<FailureRecord>,
    interrupted: bool,
}

impl ReportBuilder {
    /// Starts a report; the start time is taken now
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            started_at: Local::now(),
            counts: IndexMap::new(),
            totals: Totals::default(),
            failures: Vec::new(),
            interrupted: false,
        }
    }

    /// Adds `count` discovered documents to a category and to the total
    pub fn record(&mut self, category: &CategoryKey, count: usize) {
        *self.counts.entry(category.clone()).or_insert(0) += count;
        self.totals.total += count;
    }

    /// Tallies download outcomes; failures are kept with their reason
    pub fn record_outcomes(&mut self, category: &CategoryKey, outcomes: &[DownloadOutcome]) {
        for outcome in outcomes {
            match outcome.failure() {
                None => self.totals.succeeded += 1,
                Some(reason) => {
                    self.totals.failed += 1;
                    self.failures.push(FailureRecord {
                        category: category.to_string(),
                        url: outcome.link().url.to_string(),
                        reason: reason.to_string(),
                    });
                }
            }
        }
    }

    /// Records a failure that is not tied to a download outcome
    pub fn record_failure(&mut self, category: &CategoryKey, url: &str, reason: &str) {
        self.failures.push(FailureRecord {
            category: category.to_string(),
            url: url.to_string(),
            reason: reason.to_string(),
        });
    }

    /// Counts a document that could not even be located as failed
    pub fn record_missing(&mut self, category: &CategoryKey, url: &str, reason: &str) {
        self.totals.failed += 1;
        self.record_failure(category, url, reason);
    }

    /// Records everything a crawl produced
    ///
    /// A failed index fetch is listed under failures; a 404 index is not,
    /// since unpublished years are expected.
    pub fn record_crawl(&mut self, result: &CrawlResult) {
        self.record(&result.category, result.len());
        self.record_outcomes(&result.category, &result.outcomes);

        match &result.index_status {
            IndexStatus::Failed(reason) => {
                self.record_failure(
                    &result.category,
                    result.source_index_url.as_str(),
                    reason,
                );
            }
            IndexStatus::Interrupted => self.mark_interrupted(),
            IndexStatus::Fetched | IndexStatus::NotFound => {}
        }
    }

    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    /// Finished copy of the data recorded so far
    pub fn snapshot(&self) -> RunReport {
        self.build(Local::now())
    }

    /// Freezes the report; the finish time is taken now
    pub fn finalize(self) -> RunReport {
        self.snapshot()
    }

    fn build(&self, finished_at: DateTime<Local>) -> RunReport {
        RunReport {
            kind: self.kind.clone(),
            started_at: self.started_at,
            finished_at,
            categories: self
                .counts
                .iter()
                .map(|(category, count)| CategoryCount {
                    category: category.clone(),
                    count: *count,
                })
                .collect(),
            totals: self.totals,
            failures: self.failures.clone(),
            interrupted: self.interrupted,
        }
    }
}

/// Writes `value` as pretty JSON to `<path>.tmp`, then renames it over `path`
///
/// Non-ASCII text is written as-is. The parent directory is created if
/// missing.
pub fn persist_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), ScraperError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ScraperError::filesystem(parent, e))?;
    }

    let json = serde_json::to_string_pretty(value)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, json).map_err(|e| ScraperError::filesystem(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(ScraperError::filesystem(path, e));
    }

    Ok(())
}

/// Path for a new report: `<data_dir>/reporte_<kind>_<YYYYMMDD_HHMMSS>.json`
///
/// An existing report is never overwritten; `_1`, `_2`, ... is appended to the
/// stem until the name is free.
pub fn report_path(data_dir: &Path, kind: &str, timestamp: &DateTime<Local>) -> PathBuf {
    let stem = format!("reporte_{}_{}", kind, timestamp.format("%Y%m%d_%H%M%S"));

    let candidate = data_dir.join(format!("{}.json", stem));
    if !candidate.exists() {
        return candidate;
    }

    let mut n = 1;
    loop {
        let candidate = data_dir.join(format!("{}_{}.json", stem, n));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
