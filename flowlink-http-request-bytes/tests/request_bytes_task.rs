//! Byte-result request task behavior against a stub HTTP server.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use flowlink_http_request_bytes::{
    CancellationToken, HttpTaskError, Input, Options, RequestBytesTask,
};

#[tokio::test]
async fn binary_bodies_survive_the_round_trip() {
    // PNG-like fixture: magic bytes followed by every byte value.
    let mut fixture = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    fixture.extend(0..=255u8);

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/image.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "image/png")
                .set_body_bytes(fixture.clone()),
        )
        .mount(&server)
        .await;

    let task = RequestBytesTask::new();
    let result = task
        .run(
            &Input {
                url: format!("{}/image.png", server.uri()),
                ..Input::default()
            },
            &Options::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.body_bytes, fixture);
    assert_eq!(result.status_code, 200);
    assert_eq!(result.content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn empty_body_yields_zero_bytes_and_zero_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let task = RequestBytesTask::new();
    let result = task
        .run(
            &Input {
                url: format!("{}/empty", server.uri()),
                ..Input::default()
            },
            &Options::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(result.body_bytes.is_empty());
    assert_eq!(result.body_size_in_megabytes, 0.0);
}

#[tokio::test]
async fn size_metric_follows_the_body_length() {
    let body = vec![0u8; 512 * 1024];

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blob"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&server)
        .await;

    let task = RequestBytesTask::new();
    let result = task
        .run(
            &Input {
                url: format!("{}/blob", server.uri()),
                ..Input::default()
            },
            &Options::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(result.body_size_in_megabytes, 0.5);
}

#[tokio::test]
async fn error_status_honors_the_throw_flag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let task = RequestBytesTask::new();
    let input = Input {
        url: format!("{}/broken", server.uri()),
        ..Input::default()
    };

    let err = task
        .run(
            &input,
            &Options::builder().throw_on_error_response(true).build(),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HttpTaskError::ErrorResponse { status: 500, .. }));

    let result = task
        .run(&input, &Options::default(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.status_code, 500);
    assert_eq!(result.body_bytes, b"boom");
}
