use async_trait::async_trait;

use crate::chat::ChatCompletions;
use crate::traits::{CompletionRequest, LlmClient, LlmError};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

pub struct OpenAiClient {
    chat: ChatCompletions,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String) -> Result<Self, LlmError> {
        Self::with_endpoint(OPENAI_API_BASE, api_key, model)
    }

    /// Alternate base URL (Azure, gateways, tests).
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
impl LlmClient for OpenAiClient {
    async fn complete(&self, req: &CompletionRequest) -> Result<String, LlmError> {
        self.chat.complete(req).await
    }

    fn model_name(&self) -> &str {
        self.chat.model()
    }
}
