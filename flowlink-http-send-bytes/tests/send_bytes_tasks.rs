//! Byte-sending task behavior against a stub HTTP server.

use wiremock::matchers::{body_bytes, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use flowlink_http_send_bytes::{
    BodyMethod, CancellationToken, HttpTaskError, Input, Options, SendAndReceiveBytesTask,
    SendBytesTask,
};

#[tokio::test]
async fn sent_bytes_reach_the_server_unchanged() {
    let payload: Vec<u8> = (0..=255u8).collect();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sink"))
        .and(body_bytes(payload.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_string("received"))
        .expect(1)
        .mount(&server)
        .await;

    let task = SendBytesTask::new();
    let result = task
        .run(
            &Input {
                url: format!("{}/sink", server.uri()),
                content_bytes: payload,
                ..Input::default()
            },
            &Options::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.status_code, 200);
    assert_eq!(result.body, "received");
}

#[tokio::test]
async fn post_with_query_parameters_returns_foobar() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/endpoint"))
        .and(query_param("foo", "bar"))
        .and(query_param("bar", "foo"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/octet-stream")
                .set_body_string("FooBar"),
        )
        .mount(&server)
        .await;

    let task = SendAndReceiveBytesTask::new();
    let result = task
        .run(
            &Input {
                url: format!("{}/endpoint?foo=bar&bar=foo", server.uri()),
                ..Input::default()
            },
            &Options::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.body_bytes, b"FooBar");
}

#[tokio::test]
async fn empty_response_body_yields_an_empty_byte_array() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/endpoint"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("Content-Type", "application/octet-stream"),
        )
        .mount(&server)
        .await;

    let task = SendAndReceiveBytesTask::new();
    let result = task
        .run(
            &Input {
                url: format!("{}/endpoint", server.uri()),
                content_bytes: Vec::new(),
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
async fn byte_echo_round_trip_is_binary_safe() {
    let mut payload = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    payload.extend((0..=255u8).rev());

    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/echo"))
        .and(body_bytes(payload.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let task = SendAndReceiveBytesTask::new();
    let result = task
        .run(
            &Input {
                method: BodyMethod::Put,
                url: format!("{}/echo", server.uri()),
                content_bytes: payload.clone(),
                ..Input::default()
            },
            &Options::default(),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.body_bytes, payload);
}

#[tokio::test]
async fn server_error_honors_the_throw_flag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/endpoint"))
        .respond_with(ResponseTemplate::new(500).set_body_string("'FooBar'"))
        .mount(&server)
        .await;

    let input = Input {
        url: format!("{}/endpoint", server.uri()),
        ..Input::default()
    };

    let task = SendBytesTask::new();
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
    assert_eq!(result.body, "'FooBar'");
}
