use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use compass_analysis::Analyzer;
use compass_llm::traits::{CompletionRequest, LlmClient, LlmError};
use compass_oauth::{OAuthConfig, PkceFlow};
use compass_server::app::{AppState, build_router};
use compass_server::cors::CorsSettings;
use compass_server::rate::FixedWindow;
use compass_store::MemoryStore;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct CannedLlm;

#[async_trait]
impl LlmClient for CannedLlm {
    async fn complete(&self, req: &CompletionRequest) -> Result<String, LlmError> {
        if req.prompt.contains("Classify the author") {
            Ok(r#"{"category": "centrist", "confidence": 0.6, "conviction": 0.5}"#.to_string())
        } else {
            Ok(r#"{"tribal_affiliation": "centrist", "based_score": 50,
                   "sincerity_score": 50, "truthfulness_score": 50, "conspiracy_score": 50}"#
                .to_string())
        }
    }

    fn model_name(&self) -> &str {
        "canned"
    }
}

fn test_router(social_base: &str) -> Router {
    let store = Arc::new(MemoryStore::new());
    let oauth = PkceFlow::new(
        OAuthConfig {
            client_id: "client".into(),
            client_secret: None,
            redirect_uri: "https://app.example.com/oauth/callback".into(),
            auth_url: "https://twitter.com/i/oauth2/authorize".into(),
            token_url: "https://api.twitter.com/2/oauth2/token".into(),
            scopes: vec!["tweet.read".into()],
        },
        store,
    )
    .unwrap();

    let state = AppState {
        analyzer: Arc::new(Analyzer::new(Arc::new(CannedLlm))),
        social_bearer: "app-bearer".into(),
        social_base: social_base.to_string(),
        oauth: Some(Arc::new(oauth)),
        limiter: Arc::new(FixedWindow::new(300, Duration::from_secs(900))),
        diag_openai: None,
        diag_grok: None,
    };
    let cors = CorsSettings {
        allowed_origins: vec!["http://localhost:3000".into()],
        default_origin: "https://app.example.com".into(),
    };
    build_router(state, cors)
}

fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn process_without_identifiers_is_400() {
    let app = test_router("https://api.twitter.com");
    let response = app
        .oneshot(json_post("/process", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid request");
    assert!(body["details"].as_str().unwrap().contains("accessToken"));
}

#[tokio::test]
async fn process_unknown_user_is_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/by/username/ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errors": [{"title": "Not Found Error"}]
        })))
        .mount(&server)
        .await;

    let app = test_router(&server.uri());
    let response = app
        .oneshot(json_post("/process", serde_json::json!({"username": "ghost"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "user not found");
}

#[tokio::test]
async fn process_returns_report_for_known_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/1001/tweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"id": "1", "text": "everyone should calm down"}]
        })))
        .mount(&server)
        .await;

    let app = test_router(&server.uri());
    let response = app
        .oneshot(json_post("/process", serde_json::json!({"userId": "1001"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["classification"]["category"], "centrist");
    assert_eq!(body["based"]["tribal_affiliation"], "centrist");
}

#[tokio::test]
async fn preflight_gets_default_origin_for_disallowed_caller() {
    let app = test_router("https://api.twitter.com");
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/process")
        .header(header::ORIGIN, "https://evil.example.net")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "https://app.example.com"
    );
}

#[tokio::test]
async fn allowed_origin_is_echoed_on_responses() {
    let app = test_router("https://api.twitter.com");
    let mut request = json_post("/process", serde_json::json!({}));
    request
        .headers_mut()
        .insert(header::ORIGIN, "http://localhost:3000".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "http://localhost:3000"
    );
}

#[tokio::test]
async fn oauth_init_returns_ticket_json() {
    let app = test_router("https://api.twitter.com");
    let response = app
        .oneshot(json_post("/oauth/init", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["url"].as_str().unwrap().contains("code_challenge="));
    assert!(!body["state"].as_str().unwrap().is_empty());
    assert_eq!(body["expires_in"], 600);
}

#[tokio::test]
async fn oauth_request_token_redirects() {
    let app = test_router("https://api.twitter.com");
    let request = Request::builder()
        .method("GET")
        .uri("/oauth/request_token")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers().get(header::LOCATION).unwrap();
    assert!(location.to_str().unwrap().starts_with("https://twitter.com/i/oauth2/authorize"));
}

#[tokio::test]
async fn oauth_callback_with_unknown_state_is_400() {
    let app = test_router("https://api.twitter.com");
    let request = Request::builder()
        .method("GET")
        .uri("/oauth/callback?code=abc&state=never-issued")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "oauth error");
}

#[tokio::test]
async fn diagnostics_404_when_provider_missing() {
    let app = test_router("https://api.twitter.com");
    let response = app
        .oneshot(json_post("/openai", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
