//! Laws run: one PDF per catalogue entry from LeyChile

use crate::catalog::LawEntry;
use crate::config::Config;
use crate::crawler::{
    find_primary_pdf_link, law_filename, DocumentLink, DownloadOutcome, Downloader, RateLimiter,
    SkipReason, Transport,
};
use crate::output::{persist_json, report_path, CategoryKey, LawReport, ReportBuilder, RunReport};
use crate::shutdown::Shutdown;
use crate::url::host_key;
use crate::ScraperError;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Report group for laws
pub const LAWS_GROUP: &str = "leyes";

/// What happened to one law
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LawStatus {
    /// A PDF link was found and a download attempted
    Document(DownloadOutcome),

    /// The law page loaded but carried no PDF link
    NoLinkFound,

    /// The law page itself could not be loaded
    PageUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LawResult {
    pub entry: LawEntry,
    pub status: LawStatus,
}

impl LawResult {
    /// True if the law's PDF is on disk
    pub fn is_success(&self) -> bool {
        matches!(&self.status, LawStatus::Document(outcome) if outcome.status().is_success())
    }
}

/// Everything a laws run produced
#[derive(Debug, Clone)]
pub struct LawRunOutcome {
    pub report: RunReport,
    pub view: LawReport,
    pub results: Vec<LawResult>,
    pub report_path: PathBuf,
}

/// Downloads every catalogued law and writes `reporte_leyes_*.json`
pub struct LawRun {
    config: Config,
    transport: Arc<dyn Transport>,
    limiter: Arc<dyn RateLimiter>,
    shutdown: Shutdown,
}

impl LawRun {
    pub fn new(config: Config, transport: Arc<dyn Transport>, limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            config,
            transport,
            limiter,
            shutdown: Shutdown::new(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Processes the catalogue in order and persists the report
    pub async fn execute(self) -> Result<LawRunOutcome, ScraperError> {
        tracing::info!("Starting tax law download from LeyChile");

        let origin = Url::parse(&self.config.leychile.base_origin)?;
        let destination = self.config.output.resolve(&self.config.leychile.destination);
        let downloader = Downloader::new(self.transport.clone(), self.limiter.clone());
        let catalogue = self.config.leychile.catalogue();
        let category = CategoryKey::new(LAWS_GROUP, None);

        let mut builder = ReportBuilder::new(LAWS_GROUP);
        let mut results = Vec::with_capacity(catalogue.len());

        for entry in &catalogue {
            if self.shutdown.is_triggered() {
                tracing::warn!(
                    "Interrupted after {} of {} laws",
                    results.len(),
                    catalogue.len()
                );
                builder.mark_interrupted();
                break;
            }

            let status = self
                .process(entry, &downloader, &origin, &destination)
                .await;

            builder.record(&category, 1);
            match &status {
                LawStatus::Document(outcome) => {
                    builder.record_outcomes(&category, std::slice::from_ref(outcome))
                }
                LawStatus::NoLinkFound => {
                    builder.record_missing(&category, &entry.url, "No PDF link found")
                }
                LawStatus::PageUnavailable(reason) => {
                    builder.record_missing(&category, &entry.url, reason)
                }
            }

            results.push(LawResult {
                entry: entry.clone(),
                status,
            });
        }

        let report = builder.finalize();
        let view = LawReport::new(&report, &results, catalogue.len());
        let path = report_path(&self.config.output.data_path(), LAWS_GROUP, &Local::now());
        persist_json(&view, &path)?;

        tracing::info!(
            "Download finished: {}/{} successful",
            view.exitosas,
            view.total
        );
        tracing::info!("Report saved to: {}", path.display());

        Ok(LawRunOutcome {
            report,
            view,
            results,
            report_path: path,
        })
    }

    /// Fetches a law page, finds its PDF link and downloads it
    ///
    /// An already-downloaded law is skipped before its page is requested,
    /// since its filename depends only on the catalogue entry.
    async fn process(
        &self,
        entry: &LawEntry,
        downloader: &Downloader,
        origin: &Url,
        destination: &Path,
    ) -> LawStatus {
        let page_url = match Url::parse(&entry.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Invalid URL for {}: {}", entry.code, e);
                return LawStatus::PageUnavailable(ScraperError::from(e).to_string());
            }
        };

        let target = destination.join(law_filename(entry));
        if target.exists() {
            tracing::info!("Already exists: {}", target.display());
            let link = DocumentLink {
                url: page_url.clone(),
                anchor_text: entry.name.clone(),
                source_page: page_url,
            };
            return LawStatus::Document(DownloadOutcome::skipped(
                link,
                target,
                SkipReason::AlreadyExists,
            ));
        }

        tracing::info!("Downloading: {}", entry.name);
        self.limiter.wait(&host_key(&page_url)).await;

        let response = match self.transport.get(&page_url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Error downloading {}: {}", entry.name, e);
                return LawStatus::PageUnavailable(e.to_string());
            }
        };

        if !response.is_success() {
            let e = ScraperError::HttpStatus {
                url: page_url.to_string(),
                status: response.status,
            };
            tracing::error!("Error downloading {}: {}", entry.name, e);
            return LawStatus::PageUnavailable(e.to_string());
        }

        let Some(link) = find_primary_pdf_link(&response.body, &response.final_url, origin) else {
            tracing::warn!("No PDF link found for {}", entry.name);
            return LawStatus::NoLinkFound;
        };

        tracing::debug!("PDF link for {}: {}", entry.code, link.url);
        LawStatus::Document(downloader.download(&link, &target).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::testing::FakeTransport;
    use crate::crawler::NoDelay;
    use crate::output::Estado;
    use tempfile::TempDir;

    const PAGE: &str = "https://www.bcn.cl/leychile/navegar?idNorma=2869";
    const PDF: &str = "https://www.bcn.cl/leychile/pdf/2869.pdf";

    fn law(code: &str, id: &str, name: &str) -> LawEntry {
        LawEntry {
            code: code.to_string(),
            id: id.to_string(),
            name: name.to_string(),
            url: format!("https://www.bcn.cl/leychile/navegar?idNorma={}", id),
        }
    }

    fn config(root: &Path, laws: Vec<LawEntry>) -> Config {
        let mut config = Config::default();
        config.output.root = root.to_path_buf();
        config.leychile.laws = laws;
        config
    }

    #[tokio::test]
    async fn test_law_downloaded() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(
            FakeTransport::new()
                .with_response(PAGE, 200, r#"<a href="/leychile/pdf/2869.pdf">Descargar</a>"#)
                .with_response(PDF, 200, b"%PDF".to_vec()),
        );
        let laws = vec![law("DL_830", "2869", "Código Tributario")];

        let outcome = LawRun::new(config(dir.path(), laws), transport, Arc::new(NoDelay))
            .execute()
            .await
            .unwrap();

        assert!(outcome.results[0].is_success());
        assert_eq!(outcome.view.exitosas, 1);
        assert!(dir.path().join("leyes/2869_Código_Tributario.pdf").exists());
        assert!(outcome.report_path.starts_with(dir.path().join("data")));
    }

    #[tokio::test]
    async fn test_existing_law_skips_page_fetch() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("leyes")).unwrap();
        std::fs::write(dir.path().join("leyes/2869_Código_Tributario.pdf"), b"%PDF").unwrap();
        let transport = Arc::new(FakeTransport::new());
        let laws = vec![law("DL_830", "2869", "Código Tributario")];

        let outcome = LawRun::new(config(dir.path(), laws), transport.clone(), Arc::new(NoDelay))
            .execute()
            .await
            .unwrap();

        assert_eq!(transport.calls(), 0);
        assert_eq!(outcome.view.detalles[0].estado, Estado::Exitoso);
    }

    #[tokio::test]
    async fn test_page_without_pdf_is_fallido() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(
            FakeTransport::new().with_response(PAGE, 200, r#"<a href="/inicio">Inicio</a>"#),
        );
        let laws = vec![law("DL_830", "2869", "Código Tributario")];

        let outcome = LawRun::new(config(dir.path(), laws), transport, Arc::new(NoDelay))
            .execute()
            .await
            .unwrap();

        assert_eq!(outcome.results[0].status, LawStatus::NoLinkFound);
        assert_eq!(outcome.view.detalles[0].estado, Estado::Fallido);
        assert_eq!(outcome.report.totals.failed, 1);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_others() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(
            FakeTransport::new()
                .with_error(
                    "https://www.bcn.cl/leychile/navegar?idNorma=1",
                    "connection reset",
                )
                .with_response(PAGE, 200, r#"<a href="/leychile/pdf/2869.pdf">PDF</a>"#)
                .with_response(PDF, 200, b"%PDF".to_vec()),
        );
        let laws = vec![law("X", "1", "Ley X"), law("DL_830", "2869", "Código Tributario")];

        let outcome = LawRun::new(config(dir.path(), laws), transport, Arc::new(NoDelay))
            .execute()
            .await
            .unwrap();

        assert!(matches!(
            outcome.results[0].status,
            LawStatus::PageUnavailable(_)
        ));
        assert_eq!(outcome.view.detalles[0].estado, Estado::Error);
        assert!(outcome.results[1].is_success());
        assert_eq!(outcome.view.exitosas, 1);
        assert_eq!(outcome.view.fallidas, 1);
    }
}
