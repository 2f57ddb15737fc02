use async_trait::async_trait;

use crate::chat::ChatCompletions;
use crate::traits::{CompletionRequest, LlmClient, LlmError};

const XAI_API_BASE: &str = "https://api.x.ai/v1";

/// Grok speaks the OpenAI chat-completions dialect on api.x.ai.
pub struct GrokClient {
    chat: ChatCompletions,
}

impl GrokClient {
    pub fn new(api_key: String, model: String) -> Result<Self, LlmError> {
        Self::with_endpoint(XAI_API_BASE, api_key, model)
    }

    pub fn with_endpoint(
        endpoint: &str,
        api_key: String,
        model: String,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            chat: ChatCompletions::new(endpoint, api_key, model)?,
        })
    }
}

#[async_trait]
impl LlmClient for GrokClient {
    async fn complete(&self, req: &CompletionRequest) -> Result<String, LlmError> {
        self.chat.complete(req).await
    }

    fn model_name(&self) -> &str {
        self.chat.model()
    }
}
