//! Integration tests for index crawling
//!
//! These tests use wiremock to serve index pages and documents and run the
//! full fetch, extract, download cycle over real HTTP.

use crate::common::{http_transport, test_config, TEST_USER_AGENT};
use normativa_scraper::crawler::{
    CrawlTarget, DownloadStatus, Downloader, IndexCrawler, IndexStatus, LinkFilters, NoDelay,
    PerHostDelay, RateLimiter, SkipReason,
};
use normativa_scraper::output::CategoryKey;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn crawler(root: &Path, origin: &str, limiter: Arc<dyn RateLimiter>) -> IndexCrawler {
    let config = test_config(root);
    let transport = http_transport(&config);
    let downloader = Downloader::new(transport.clone(), limiter.clone());
    IndexCrawler::new(transport, downloader, limiter, Url::parse(origin).unwrap())
}

fn target(server: &MockServer, root: &Path) -> CrawlTarget {
    CrawlTarget {
        index_url: Url::parse(&format!("{}/normativa/2024/res_ind2024.htm", server.uri())).unwrap(),
        category: CategoryKey::yearly("resoluciones", 2024),
        file_prefix: "resolucion".to_string(),
        destination: root.join("resoluciones").join("2024"),
        filters: LinkFilters::new([".pdf", ".doc", ".docx"], ["resolucion", "res_"], true),
        expected_extension: "pdf".to_string(),
    }
}

async fn mount_pdf(server: &MockServer, pdf_path: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(pdf_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"%PDF-1.4 test".to_vec())
                .insert_header("content-type", "application/pdf"),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_crawl_downloads_documents() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/normativa/2024/res_ind2024.htm"))
        .and(header("user-agent", TEST_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
            <a href="/doc/a.pdf">Resolución A</a>
            <a href="/doc/a.pdf">Resolución A (duplicado)</a>
            <a href="reso_b.pdf">Resolución B</a>
            <a href="/ayuda.htm">Ayuda</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    mount_pdf(&server, "/doc/a.pdf", 1).await;
    mount_pdf(&server, "/normativa/2024/reso_b.pdf", 1).await;

    let crawler = crawler(dir.path(), &server.uri(), Arc::new(NoDelay));
    let result = crawler.crawl(&target(&server, dir.path())).await;

    assert_eq!(result.index_status, IndexStatus::Fetched);
    assert_eq!(result.len(), 2);
    assert_eq!(result.succeeded(), 2);

    let a = dir.path().join("resoluciones/2024/a.pdf");
    assert_eq!(std::fs::read(&a).unwrap(), b"%PDF-1.4 test");
    assert!(dir.path().join("resoluciones/2024/reso_b.pdf").exists());
}

#[tokio::test]
async fn test_second_crawl_skips_existing_documents() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/normativa/2024/res_ind2024.htm"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<a href="/doc/a.pdf">Resolución A</a>"#),
        )
        .expect(2)
        .mount(&server)
        .await;
    // Downloaded once only; the rerun must not request it
    mount_pdf(&server, "/doc/a.pdf", 1).await;

    let crawler = crawler(dir.path(), &server.uri(), Arc::new(NoDelay));
    let target = target(&server, dir.path());

    let first = crawler.crawl(&target).await;
    let second = crawler.crawl(&target).await;

    assert_eq!(first.outcomes[0].status(), &DownloadStatus::Downloaded);
    assert_eq!(
        second.outcomes[0].status(),
        &DownloadStatus::Skipped(SkipReason::AlreadyExists)
    );
}

#[tokio::test]
async fn test_unpublished_year_is_empty() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let crawler = crawler(dir.path(), &server.uri(), Arc::new(NoDelay));
    let result = crawler.crawl(&target(&server, dir.path())).await;

    assert_eq!(result.index_status, IndexStatus::NotFound);
    assert!(result.outcomes.is_empty());
}

#[tokio::test]
async fn test_document_server_error_recorded() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/normativa/2024/res_ind2024.htm"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="/doc/a.pdf">Resolución A</a><a href="/doc/b.pdf">Resolución B</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/doc/a.pdf"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_pdf(&server, "/doc/b.pdf", 1).await;

    let crawler = crawler(dir.path(), &server.uri(), Arc::new(NoDelay));
    let result = crawler.crawl(&target(&server, dir.path())).await;

    assert_eq!(result.succeeded(), 1);
    assert_eq!(result.failed(), 1);
    assert!(result.outcomes[0].failure().unwrap().contains("HTTP 500"));
    assert!(!dir.path().join("resoluciones/2024/a.pdf").exists());
}

#[tokio::test]
async fn test_requests_to_same_host_are_spaced() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/normativa/2024/res_ind2024.htm"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="/doc/a.pdf">A</a><a href="/doc/b.pdf">B</a>"#,
        ))
        .mount(&server)
        .await;
    mount_pdf(&server, "/doc/a.pdf", 1).await;
    mount_pdf(&server, "/doc/b.pdf", 1).await;

    let limiter = Arc::new(PerHostDelay::new(Duration::from_millis(100)));
    let crawler = crawler(dir.path(), &server.uri(), limiter);

    let start = Instant::now();
    let result = crawler.crawl(&target(&server, dir.path())).await;

    assert_eq!(result.succeeded(), 2);
    // index + two documents: two gaps of at least 100ms
    assert!(start.elapsed() >= Duration::from_millis(200));
}
