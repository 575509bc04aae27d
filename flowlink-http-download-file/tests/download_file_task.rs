//! Download task behavior against a stub HTTP server.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use flowlink_http_download_file::{
    CancellationToken, DownloadFileTask, HttpTaskError, Input, Options,
};

async fn mount_file(server: &MockServer, route: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn downloads_the_body_to_the_destination() {
    let server = MockServer::start().await;
    mount_file(&server, "/file.txt", b"downloaded content").await;

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("file.txt");

    let task = DownloadFileTask::new();
    let result = task
        .run(
            &Input {
                url: format!("{}/file.txt", server.uri()),
                file_path: destination.clone(),
                ..Input::default()
            },
            &Options::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.file_path, destination);
    assert_eq!(std::fs::read(&destination).unwrap(), b"downloaded content");
}

#[tokio::test]
async fn binary_downloads_are_byte_exact() {
    let mut fixture = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    fixture.extend((0..=255u8).cycle().take(64 * 1024));

    let server = MockServer::start().await;
    mount_file(&server, "/image.png", &fixture).await;

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("image.png");

    let task = DownloadFileTask::new();
    task.run(
        &Input {
            url: format!("{}/image.png", server.uri()),
            file_path: destination.clone(),
            ..Input::default()
        },
        &Options::default(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(std::fs::read(&destination).unwrap(), fixture);
}

#[tokio::test]
async fn existing_destination_is_left_untouched_without_overwrite() {
    let server = MockServer::start().await;
    mount_file(&server, "/file.txt", b"NEW CONTENT").await;

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("file.txt");
    std::fs::write(&destination, b"OLD CONTENT").unwrap();

    let task = DownloadFileTask::new();
    let err = task
        .run(
            &Input {
                url: format!("{}/file.txt", server.uri()),
                file_path: destination.clone(),
                overwrite: false,
                ..Input::default()
            },
            &Options::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, HttpTaskError::Configuration(_)));
    assert_eq!(std::fs::read(&destination).unwrap(), b"OLD CONTENT");
}

#[tokio::test]
async fn overwrite_replaces_the_existing_file() {
    let server = MockServer::start().await;
    mount_file(&server, "/file.txt", b"NEW CONTENT").await;

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("file.txt");
    std::fs::write(&destination, b"OLD CONTENT").unwrap();

    let task = DownloadFileTask::new();
    let result = task
        .run(
            &Input {
                url: format!("{}/file.txt", server.uri()),
                file_path: destination.clone(),
                overwrite: true,
                ..Input::default()
            },
            &Options::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(std::fs::read(&destination).unwrap(), b"NEW CONTENT");
}

#[tokio::test]
async fn error_status_with_throw_flag_fails_and_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.txt"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("missing.txt");

    let task = DownloadFileTask::new();
    let err = task
        .run(
            &Input {
                url: format!("{}/missing.txt", server.uri()),
                file_path: destination.clone(),
                ..Input::default()
            },
            &Options::builder().throw_on_error_response(true).build(),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        HttpTaskError::ErrorResponse { status, body, .. } => {
            assert_eq!(status, 404);
            assert!(body.contains("not here"));
        }
        other => panic!("expected ErrorResponse, got {other:?}"),
    }
    assert!(!destination.exists());
}

#[tokio::test]
async fn empty_url_fails_before_touching_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("never.txt");

    let task = DownloadFileTask::new();
    let err = task
        .run(
            &Input {
                file_path: destination.clone(),
                ..Input::default()
            },
            &Options::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, HttpTaskError::Configuration(_)));
    assert!(!destination.exists());
}
