//! End-to-end laws run over a small catalogue served by a mock LeyChile

use crate::common::{http_transport, test_config};
use normativa_scraper::catalog::LawEntry;
use normativa_scraper::config::Config;
use normativa_scraper::crawler::NoDelay;
use normativa_scraper::runs::{LawRun, LawStatus};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn law(server: &MockServer, code: &str, id: &str, name: &str) -> LawEntry {
    LawEntry {
        code: code.to_string(),
        id: id.to_string(),
        name: name.to_string(),
        url: format!("{}/leychile/navegar?idNorma={}", server.uri(), id),
    }
}

fn laws_config(server: &MockServer, root: &Path) -> Config {
    let mut config = test_config(root);
    config.leychile.base_origin = server.uri();
    config.leychile.laws = vec![
        law(server, "DL_824_Renta", "6368", "Decreto Ley 824 - Ley sobre Impuesto a la Renta"),
        law(server, "DL_825_IVA", "6369", "Decreto Ley 825 - Ley sobre Impuesto a las Ventas y Servicios"),
        law(server, "Ley_20780", "1067194", "Ley 20.780 - Reforma Tributaria"),
        law(server, "Ley_16271", "28291", "Ley 16.271 - Impuesto a las Herencias"),
    ];
    config
}

async fn mount_page(server: &MockServer, id: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path("/leychile/navegar"))
        .and(query_param("idNorma", id))
        .respond_with(ResponseTemplate::new(status).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

async fn mount_site(server: &MockServer) {
    // Found by href
    mount_page(
        server,
        "6368",
        200,
        r#"<a href="/leychile/inicio">Inicio</a>
           <a href="/leychile/pdf/6368.pdf">Texto completo</a>"#,
    )
    .await;
    // Found only through the linkPdf element
    mount_page(
        server,
        "6369",
        200,
        r#"<a id="linkPdf" href="/leychile/archivo?id=6369"></a>"#,
    )
    .await;
    // Page without any PDF link
    mount_page(server, "1067194", 200, r#"<a href="/leychile/inicio">Inicio</a>"#).await;
    // Page error
    mount_page(server, "28291", 500, "").await;

    Mock::given(method("GET"))
        .and(path("/leychile/pdf/6368.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF renta".to_vec()))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/leychile/archivo"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF iva".to_vec()))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_laws_run_end_to_end() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_site(&server).await;

    let config = laws_config(&server, dir.path());
    let transport = http_transport(&config);
    let outcome = LawRun::new(config, transport, Arc::new(NoDelay))
        .execute()
        .await
        .unwrap();

    let leyes = dir.path().join("leyes");
    assert_eq!(
        std::fs::read(leyes.join("6368_Decreto_Ley_824___Ley_sobre_Impuesto_a_la_Renta.pdf")).unwrap(),
        b"%PDF renta"
    );
    assert!(leyes
        .join("6369_Decreto_Ley_825___Ley_sobre_Impuesto_a_las_Ventas_y_Servicios.pdf")
        .exists());

    assert!(outcome.results[0].is_success());
    assert!(outcome.results[1].is_success());
    assert_eq!(outcome.results[2].status, LawStatus::NoLinkFound);
    assert!(matches!(outcome.results[3].status, LawStatus::PageUnavailable(_)));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&outcome.report_path).unwrap()).unwrap();
    assert_eq!(json["exitosas"], 2);
    assert_eq!(json["fallidas"], 2);
    assert_eq!(json["total"], 4);
    assert_eq!(json["detalles"][0]["codigo"], "DL_824_Renta");
    assert_eq!(json["detalles"][0]["estado"], "exitoso");
    assert_eq!(json["detalles"][2]["estado"], "fallido");
    assert_eq!(json["detalles"][3]["estado"], "error");
    assert!(json["detalles"][3]["error"].as_str().unwrap().contains("HTTP 500"));

    let name = outcome.report_path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("reporte_leyes_"));
}

#[tokio::test]
async fn test_laws_rerun_skips_downloaded() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_site(&server).await;

    let config = laws_config(&server, dir.path());
    let transport = http_transport(&config);

    LawRun::new(config.clone(), transport.clone(), Arc::new(NoDelay))
        .execute()
        .await
        .unwrap();
    let second = LawRun::new(config, transport, Arc::new(NoDelay))
        .execute()
        .await
        .unwrap();

    // PDF mocks expect one request each; verified when the server drops
    assert_eq!(second.view.exitosas, 2);
}
