//! Smoke tests for the facade surface.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use flowlink_http::prelude::*;

#[tokio::test]
async fn request_task_runs_through_the_prelude() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .mount(&server)
        .await;

    let task = RequestTask::new();
    let result = task
        .run(
            &request::Input {
                url: format!("{}/ping", server.uri()),
                ..request::Input::default()
            },
            &Options::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(result.status_code, 200);
}

#[tokio::test]
async fn download_task_runs_through_the_prelude() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/file.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("facade download"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("file.txt");

    let task = DownloadFileTask::new();
    let result = task
        .run(
            &download_file::Input {
                url: format!("{}/file.txt", server.uri()),
                file_path: destination.clone(),
                ..download_file::Input::default()
            },
            &Options::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(std::fs::read(&destination).unwrap(), b"facade download");
}
