use std::fs;

use pharmagarde::ScrapeError;
use pharmagarde::config::Config;
use pharmagarde::extractor::{ExtractError, ScrapeResult, Strategy};
use pharmagarde::run::{PageSource, scrape, scrape_and_save};
use pharmagarde::storage::{BACKUP_FILE, OUTPUT_FILE};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const LINES_PAGE: &str = include_str!("../src/extractor/tests/fixtures/lines.html");
const TAGS_PAGE: &str = include_str!("../src/extractor/tests/fixtures/tags.html");
const GARBLED_PAGE: &str = include_str!("../src/extractor/tests/fixtures/garbled.html");

async fn serve(body: &str, status: u16) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/on-call"))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_bytes(body.as_bytes().to_vec())
                .insert_header("Content-Type", "text/html; charset=utf-8"),
        )
        .mount(&mock_server)
        .await;
    mock_server
}

fn config_for(server: &MockServer, output_dir: &std::path::Path) -> Config {
    Config::default()
        .with_source_url(format!("{}/on-call", server.uri()))
        .unwrap()
        .with_output_dir(output_dir)
}

fn remote(config: &Config) -> PageSource {
    PageSource::Remote(config.source_url().to_string())
}

#[tokio::test]
async fn test_run_writes_document() {
    let server = serve(LINES_PAGE, 200).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, dir.path());

    let result = scrape_and_save(&config, &remote(&config)).await.unwrap();
    assert_eq!(result.pharmacy_count(), 5);
    assert_eq!(result.metadata.source_url, config.source_url());

    let written = fs::read_to_string(dir.path().join(OUTPUT_FILE)).unwrap();
    assert!(written.contains("\"city\": \"Lomé\""));
    let parsed: ScrapeResult = serde_json::from_str(&written).unwrap();
    assert_eq!(parsed, result);

    assert!(!dir.path().join(BACKUP_FILE).exists());
}

#[tokio::test]
async fn test_second_run_backs_up_previous_output() {
    let server = serve(LINES_PAGE, 200).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, dir.path());

    scrape_and_save(&config, &remote(&config)).await.unwrap();
    let first = fs::read(dir.path().join(OUTPUT_FILE)).unwrap();

    scrape_and_save(&config, &remote(&config)).await.unwrap();
    let backup = fs::read(dir.path().join(BACKUP_FILE)).unwrap();
    assert_eq!(backup, first);
}

#[tokio::test]
async fn test_auto_strategy_reads_tag_layout() {
    let server = serve(TAGS_PAGE, 200).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, dir.path());
    assert_eq!(config.strategy(), Strategy::Auto);

    let result = scrape(&config, &remote(&config)).await.unwrap();
    assert_eq!(result.pharmacy_count(), 3);
}

#[tokio::test]
async fn test_server_error_fails_without_writing() {
    let server = serve("oops", 503).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, dir.path());

    let err = scrape_and_save(&config, &remote(&config)).await.unwrap_err();
    match err {
        ScrapeError::Fetch(fetch) => assert!(fetch.is_transient()),
        other => panic!("Expected fetch error, got {other:?}"),
    }
    assert!(!dir.path().join(OUTPUT_FILE).exists());
}

#[tokio::test]
async fn test_garbled_page_keeps_previous_output() {
    let server = serve(GARBLED_PAGE, 200).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, dir.path());
    fs::write(dir.path().join(OUTPUT_FILE), b"{\"previous\": true}").unwrap();

    let err = scrape_and_save(&config, &remote(&config)).await.unwrap_err();
    assert!(err.is_structural());
    assert!(matches!(
        err,
        ScrapeError::Extract(ExtractError::NoPharmacies)
    ));

    assert_eq!(
        fs::read(dir.path().join(OUTPUT_FILE)).unwrap(),
        b"{\"previous\": true}"
    );
    assert!(!dir.path().join(BACKUP_FILE).exists());
}

#[tokio::test]
async fn test_saved_page_input() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("saved.html");
    fs::write(&page, LINES_PAGE).unwrap();

    let config = Config::default().with_output_dir(dir.path().join("out"));
    let result = scrape(&config, &PageSource::File(page)).await.unwrap();

    assert_eq!(result.metadata.source_url, config.source_url());
    assert_eq!(result.zones[0].header.zone_id, "A");

    let missing = scrape(&config, &PageSource::File(dir.path().join("nope.html"))).await;
    assert!(matches!(missing, Err(ScrapeError::Io(_))));
}
