//! Shared chat-completions wire handling for OpenAI-compatible endpoints.
//!
//! All three providers (OpenAI, Grok, Perplexity) speak the same
//! `POST {base}/chat/completions` shape; the reply text lives at
//! `choices[0].message.content`. Provider wrappers differ only in base URL
//! and defaults.

use compass_http::{Auth, HttpClient, HttpError, RequestOpts};
use serde::Serialize;
use serde_json::Value;

use crate::traits::{CompletionRequest, LlmError};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

pub struct ChatCompletions {
    http: HttpClient,
    api_key: String,
    model: String,
}

impl ChatCompletions {
    /// `endpoint` is the versioned API base, e.g. `https://api.openai.com/v1`.
    pub fn new(endpoint: &str, api_key: String, model: String) -> Result<Self, LlmError> {
        // A trailing slash keeps Url::join from eating the version segment.
        let base = format!("{}/", endpoint.trim_end_matches('/'));
        let http = HttpClient::new(&base)
            .map_err(|e| LlmError::Config(format!("bad LLM endpoint: {e}")))?;
        Ok(Self {
            http,
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Full provider JSON, unmodified. Retries are the gateway's job, so
    /// the underlying client is pinned to zero.
    pub async fn raw(&self, req: &CompletionRequest) -> Result<Value, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = req.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &req.prompt,
        });

        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        };

        self.http
            .post_json(
                "chat/completions",
                &body,
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.api_key)),
                    retries: Some(0),
                    ..Default::default()
                },
            )
            .await
            .map_err(http_to_llm)
    }

    /// The assistant text from `choices[0].message.content`.
    pub async fn complete(&self, req: &CompletionRequest) -> Result<String, LlmError> {
        let value = self.raw(req).await?;
        extract_content(&value)
    }
}

fn extract_content(value: &Value) -> Result<String, LlmError> {
    value
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            LlmError::Malformed("response missing choices[0].message.content".to_string())
        })
}

fn http_to_llm(e: HttpError) -> LlmError {
    match e {
        HttpError::Network(msg) => LlmError::Transport(msg),
        HttpError::Decode(msg, snippet) => {
            LlmError::Malformed(format!("{msg} (body: {snippet})"))
        }
        HttpError::Api {
            status, message, ..
        } => LlmError::Api {
            status: status.as_u16(),
            message,
        },
        HttpError::Url(msg) | HttpError::Build(msg) => LlmError::Config(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pulls_text_from_first_choice() {
        let value = json!({
            "choices": [
                {"message": {"role": "assistant", "content": "hello there"}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        });
        assert_eq!(extract_content(&value).unwrap(), "hello there");
    }

    #[test]
    fn missing_choices_is_malformed() {
        let value = json!({"id": "cmpl-1", "object": "chat.completion"});
        assert!(matches!(
            extract_content(&value),
            Err(LlmError::Malformed(_))
        ));
    }

    #[test]
    fn non_string_content_is_malformed() {
        let value = json!({"choices": [{"message": {"content": 42}}]});
        assert!(matches!(
            extract_content(&value),
            Err(LlmError::Malformed(_))
        ));
    }
}
