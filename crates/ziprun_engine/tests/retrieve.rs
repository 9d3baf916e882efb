use std::fs;

use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use ziprun_engine::{EngineSettings, ReqwestRetriever, RetrieveFailureKind, Retriever};

fn settings(server: &MockServer, temp: &TempDir) -> EngineSettings {
    EngineSettings {
        base_url: server.uri(),
        output_dir: temp.path().join("output"),
        ..EngineSettings::default()
    }
}

#[tokio::test]
async fn result_is_saved_into_output_dir() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/archive_result.zip"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"PK\x05\x06result".to_vec(), "application/zip"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let retriever = ReqwestRetriever::new(settings(&server, &temp));
    let saved = retriever
        .retrieve("archive_result.zip")
        .await
        .expect("download ok");

    assert_eq!(saved, temp.path().join("output").join("archive_result.zip"));
    assert_eq!(fs::read(&saved).unwrap(), b"PK\x05\x06result");
}

#[tokio::test]
async fn filename_is_percent_encoded_in_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/my%20result.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"zip".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let retriever = ReqwestRetriever::new(settings(&server, &temp));
    let saved = retriever.retrieve("my result.zip").await.expect("download ok");
    assert_eq!(saved.file_name().unwrap(), "my result.zip");
}

#[tokio::test]
async fn missing_result_reports_status_and_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/gone.zip"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let retriever = ReqwestRetriever::new(settings(&server, &temp));
    let err = retriever.retrieve("gone.zip").await.unwrap_err();

    assert_eq!(err.kind, RetrieveFailureKind::HttpStatus(404));
    assert!(!temp.path().join("output").join("gone.zip").exists());
}

#[tokio::test]
async fn unwritable_output_dir_is_a_persist_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/out.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"zip".to_vec()))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("output");
    fs::write(&blocker, "not a directory").unwrap();

    let retriever = ReqwestRetriever::new(settings(&server, &temp));
    let err = retriever.retrieve("out.zip").await.unwrap_err();
    assert_eq!(err.kind, RetrieveFailureKind::Persist);
}
