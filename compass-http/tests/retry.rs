use std::borrow::Cow;
use std::time::Duration;

use compass_http::{HttpClient, HttpError, RequestOpts};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn retries_429_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/widgets"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let got: serde_json::Value = client
        .get_json(
            "v1/widgets",
            RequestOpts {
                retries: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(got["ok"], true);
}

#[tokio::test]
async fn surfaces_api_error_after_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/widgets"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(serde_json::json!({"error": {"message": "backend exploded"}})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_json::<serde_json::Value>(
            "v1/widgets",
            RequestOpts {
                retries: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    match err {
        HttpError::Api { status, message, .. } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(message, "backend exploded");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn does_not_retry_client_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/widgets"))
        .and(query_param("page", "7"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_json::<serde_json::Value>(
            "v1/widgets",
            RequestOpts {
                retries: Some(3),
                query: Some(vec![("page", Cow::Borrowed("7"))]),
                timeout: Some(Duration::from_secs(5)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(err.is_not_found(), "expected 404, got {err:?}");
}
