//! End-to-end SII run against a mock site

use crate::common::{http_transport, test_config};
use normativa_scraper::config::{Config, FilterConfig, SiiCategoryConfig};
use normativa_scraper::crawler::NoDelay;
use normativa_scraper::runs::SiiRun;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sii_config(server: &MockServer, root: &Path) -> Config {
    let uri = server.uri();
    let mut config = test_config(root);
    config.sii.base_origin = uri.clone();
    config.sii.years = vec![2023, 2024];
    config.sii.categories = vec![
        SiiCategoryConfig {
            name: "resoluciones".to_string(),
            file_prefix: "resolucion".to_string(),
            index_template: format!("{}/resoluciones/{{year}}/res_ind{{year}}.htm", uri),
            overrides: Default::default(),
            filters: FilterConfig::sii_documents(),
        },
        SiiCategoryConfig {
            name: "circulares".to_string(),
            file_prefix: "circular".to_string(),
            index_template: format!("{}/circulares/{{year}}/indcir{{year}}.htm", uri),
            overrides: Default::default(),
            filters: FilterConfig::sii_documents(),
        },
    ];
    config.sii.schemas.index_url = format!("{}/factura_electronica/formato_xml.htm", uri);
    config
}

async fn mount_html(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

async fn mount_binary(server: &MockServer, file: &str) {
    Mock::given(method("GET"))
        .and(path(file))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"binary".to_vec()))
        .expect(1)
        .mount(server)
        .await;
}

/// 2024 is published for both categories, 2023 only for circulares
async fn mount_site(server: &MockServer) {
    mount_html(
        server,
        "/resoluciones/2024/res_ind2024.htm",
        r#"<a href="reso12.pdf">Resolución Exenta Nº 12</a>
           <a href="/resoluciones/2024/detalle_res_13.htm">Resolución Nº 13 Modifica plazo</a>"#,
    )
    .await;
    mount_binary(server, "/resoluciones/2024/reso12.pdf").await;
    mount_binary(server, "/resoluciones/2024/detalle_res_13.htm").await;

    mount_html(
        server,
        "/circulares/2023/indcir2023.htm",
        r#"<a href="circu40.pdf">Circular 40</a>"#,
    )
    .await;
    mount_binary(server, "/circulares/2023/circu40.pdf").await;

    mount_html(
        server,
        "/circulares/2024/indcir2024.htm",
        r#"<a href="circu1.docx">Circular 1</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/circulares/2024/circu1.docx"))
        .respond_with(ResponseTemplate::new(503))
        .mount(server)
        .await;

    mount_html(
        server,
        "/factura_electronica/formato_xml.htm",
        r#"<a href="/factura_electronica/schema_dte.zip">DTE</a>
           <a href="/factura_electronica/manual.pdf">Manual</a>"#,
    )
    .await;
    mount_binary(server, "/factura_electronica/schema_dte.zip").await;

    // Everything else, including resoluciones 2023, is unpublished
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sii_run_end_to_end() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_site(&server).await;

    let config = sii_config(&server, dir.path());
    let transport = http_transport(&config);
    let outcome = SiiRun::new(config, transport, Arc::new(NoDelay))
        .execute()
        .await
        .unwrap();

    let root = dir.path();
    assert!(root.join("resoluciones/2024/reso12.pdf").exists());
    assert!(root
        .join("resoluciones/2024/resolucion_Resolucion_N_13_Modifica_plazo.pdf")
        .exists());
    assert!(root.join("circulares/2023/circu40.pdf").exists());
    assert!(root.join("schemas/schema_dte.zip").exists());
    assert!(!root.join("schemas/manual.pdf").exists());
    assert!(!root.join("resoluciones/2023").join("reso12.pdf").exists());

    assert_eq!(outcome.report.totals.total, 5);
    assert_eq!(outcome.report.totals.succeeded, 4);
    assert_eq!(outcome.report.totals.failed, 1);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&outcome.report_path).unwrap()).unwrap();
    assert_eq!(json["resoluciones"]["2023"], 0);
    assert_eq!(json["resoluciones"]["2024"], 2);
    assert_eq!(json["circulares"]["2023"], 1);
    assert_eq!(json["circulares"]["2024"], 1);
    assert_eq!(json["schemas"], 1);
    assert_eq!(json["resumen"]["total_documentos"], 5);
    assert_eq!(json["resumen"]["documentos_exitosos"], 4);
    assert_eq!(json["resumen"]["documentos_fallidos"], 1);
    assert_eq!(json["fallos"][0]["categoria"], "circulares_2024");
    assert_eq!(json["interrumpido"], false);

    let name = outcome.report_path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("reporte_sii_"));
    assert!(outcome.report_path.starts_with(root.join("data")));
}

#[tokio::test]
async fn test_sii_rerun_downloads_nothing_new() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_site(&server).await;

    let config = sii_config(&server, dir.path());
    let transport = http_transport(&config);

    let first = SiiRun::new(config.clone(), transport.clone(), Arc::new(NoDelay))
        .execute()
        .await
        .unwrap();
    let second = SiiRun::new(config, transport, Arc::new(NoDelay))
        .execute()
        .await
        .unwrap();

    // Binary mocks expect exactly one request each; verified when the server drops
    assert_eq!(second.report.totals, first.report.totals);
    assert_ne!(second.report_path, first.report_path);
}
