use async_trait::async_trait;

use crate::chat::ChatCompletions;
use crate::traits::{CompletionRequest, LlmClient, LlmError};

const PERPLEXITY_API_BASE: &str = "https://api.perplexity.ai";

/// Perplexity's sonar models answer with live web search behind them,
/// which is what the fact-check pass relies on.
pub struct PerplexityClient {
    chat: ChatCompletions,
}

impl PerplexityClient {
    pub fn new(api_key: String, model: String) -> Result<Self, LlmError> {
        Self::with_endpoint(PERPLEXITY_API_BASE, api_key, model)
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
impl LlmClient for PerplexityClient {
    async fn complete(&self, req: &CompletionRequest) -> Result<String, LlmError> {
        self.chat.complete(req).await
    }

    fn model_name(&self) -> &str {
        self.chat.model()
    }
}
