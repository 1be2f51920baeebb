//! Asset downloader tests against a mock HTTP server

use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use iconbox::fetch::{FetchError, download_client, fetch_to_file};
use iconbox::humanize::ByteCount;

const SVG_BODY: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0 0h24v24H0z"/></svg>"#;

async fn serve(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn streams_body_and_creates_parents() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/export/a.svg",
        ResponseTemplate::new(200).set_body_string(SVG_BODY),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("finance/deep/bank.svg");
    let client = download_client(Duration::from_secs(5)).unwrap();

    let written = fetch_to_file(
        &client,
        &format!("{}/export/a.svg", server.uri()),
        &dest,
        ByteCount(1024 * 1024),
    )
    .await
    .unwrap();

    assert_eq!(written, SVG_BODY.len() as u64);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), SVG_BODY);
}

#[tokio::test]
async fn empty_payload_is_rejected_and_cleaned_up() {
    let server = MockServer::start().await;
    serve(&server, "/export/empty.svg", ResponseTemplate::new(200)).await;

    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("icons/empty.svg");
    let client = download_client(Duration::from_secs(5)).unwrap();

    let err = fetch_to_file(
        &client,
        &format!("{}/export/empty.svg", server.uri()),
        &dest,
        ByteCount(1024),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FetchError::EmptyPayload { .. }));
    // no partial artifact survives
    assert!(!dest.exists());
}

#[tokio::test]
async fn http_error_leaves_no_file() {
    let server = MockServer::start().await;
    serve(&server, "/export/gone.svg", ResponseTemplate::new(404)).await;

    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("icons/gone.svg");
    let client = download_client(Duration::from_secs(5)).unwrap();

    let err = fetch_to_file(
        &client,
        &format!("{}/export/gone.svg", server.uri()),
        &dest,
        ByteCount(1024),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FetchError::RequestFailed(message) if message.contains("404")));
    assert!(!dest.exists());
}

#[tokio::test]
async fn oversized_payload_is_rejected_and_cleaned_up() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/export/huge.svg",
        ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 4096]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("icons/huge.svg");
    let client = download_client(Duration::from_secs(5)).unwrap();

    let err = fetch_to_file(
        &client,
        &format!("{}/export/huge.svg", server.uri()),
        &dest,
        ByteCount(1024),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FetchError::PayloadTooLarge { limit, .. } if limit.get() == 1024));
    assert!(!dest.exists());
}

#[tokio::test]
async fn overwrites_unconditionally_when_called() {
    // existence checks are the caller's job; calling fetch_to_file on
    // an existing path replaces the content
    let server = MockServer::start().await;
    serve(
        &server,
        "/export/a.svg",
        ResponseTemplate::new(200).set_body_string(SVG_BODY),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("a.svg");
    std::fs::write(&dest, "stale").unwrap();

    let client = download_client(Duration::from_secs(5)).unwrap();
    fetch_to_file(
        &client,
        &format!("{}/export/a.svg", server.uri()),
        &dest,
        ByteCount(1024),
    )
    .await
    .unwrap();

    assert_eq!(std::fs::read_to_string(&dest).unwrap(), SVG_BODY);
}
