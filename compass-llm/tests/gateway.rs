use std::sync::Arc;
use std::time::Duration;

use compass_llm::gateway::RetryingLlm;
use compass_llm::openai::OpenAiClient;
use compass_llm::traits::{CompletionRequest, LlmClient, LlmError};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "cmpl-1",
        "object": "chat.completion",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": text}}]
    })
}

fn retrying(server: &MockServer, attempts: usize) -> RetryingLlm {
    let inner =
        OpenAiClient::with_endpoint(&server.uri(), "sk-test".into(), "gpt-4o-mini".into()).unwrap();
    RetryingLlm::new(Arc::new(inner))
        .with_attempts(attempts)
        .with_backoff_base(Duration::from_millis(5))
}

#[tokio::test]
async fn completes_and_sends_system_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "system", "content": "be terse"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("ok then")))
        .expect(1)
        .mount(&server)
        .await;

    let client = retrying(&server, 3);
    let req = CompletionRequest::new("say something")
        .with_system("be terse")
        .with_temperature(0.2)
        .with_max_tokens(64);
    assert_eq!(client.complete(&req).await.unwrap(), "ok then");
}

#[tokio::test]
async fn retries_rate_limit_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("finally")))
        .expect(1)
        .mount(&server)
        .await;

    let client = retrying(&server, 3);
    let req = CompletionRequest::new("hello");
    assert_eq!(client.complete(&req).await.unwrap(), "finally");
}

#[tokio::test]
async fn malformed_reply_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "object": "chat.completion"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = retrying(&server, 4);
    let err = client
        .complete(&CompletionRequest::new("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn exhaustion_wraps_last_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .expect(3)
        .mount(&server)
        .await;

    let client = retrying(&server, 3);
    let err = client
        .complete(&CompletionRequest::new("hello"))
        .await
        .unwrap_err();
    match err {
        LlmError::RetryExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, LlmError::Api { status: 503, .. }));
        }
        other => panic!("expected RetryExhausted, got {other:?}"),
    }
}
