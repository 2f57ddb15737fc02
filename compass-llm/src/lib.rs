//! Provider-agnostic LLM integration for Compass.
//!
//! This crate exposes a narrow [`traits::LlmClient`] interface and concrete
//! provider implementations for OpenAI, Grok (xAI), and Perplexity, all
//! speaking the chat-completions dialect. [`client_from_config`] builds a
//! retry-wrapped client from a [`compass_config::LlmProviderConfig`].

pub mod chat;
pub mod gateway;
pub mod grok;
pub mod openai;
pub mod perplexity;
pub mod traits;

use std::sync::Arc;

use compass_config::LlmProviderConfig;

use chat::ChatCompletions;
use gateway::RetryingLlm;
use grok::GrokClient;
use openai::OpenAiClient;
use perplexity::PerplexityClient;
use traits::{LlmClient, LlmError};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_GROK_MODEL: &str = "grok-2-latest";
pub const DEFAULT_PERPLEXITY_MODEL: &str = "sonar";

/// Build a retry-wrapped client for the configured provider.
pub fn client_from_config(
    config: &LlmProviderConfig,
    attempts: usize,
) -> Result<Arc<dyn LlmClient>, LlmError> {
    let inner: Arc<dyn LlmClient> = match config {
        LlmProviderConfig::Openai {
            model,
            api_key,
            endpoint,
            ..
        } => Arc::new(OpenAiClient::with_endpoint(
            endpoint,
            api_key.clone(),
            model.clone(),
        )?),
        LlmProviderConfig::Grok {
            model,
            api_key,
            endpoint,
            ..
        } => Arc::new(GrokClient::with_endpoint(
            endpoint,
            api_key.clone(),
            model.clone(),
        )?),
        LlmProviderConfig::Perplexity {
            model,
            api_key,
            endpoint,
            ..
        } => Arc::new(PerplexityClient::with_endpoint(
            endpoint,
            api_key.clone(),
            model.clone(),
        )?),
    };

    Ok(Arc::new(RetryingLlm::new(inner).with_attempts(attempts)))
}

/// Unwrapped chat-completions handle for the diagnostic passthrough
/// endpoints, which return the provider's raw JSON.
pub fn raw_client_from_config(config: &LlmProviderConfig) -> Result<ChatCompletions, LlmError> {
    match config {
        LlmProviderConfig::Openai {
            model,
            api_key,
            endpoint,
            ..
        }
        | LlmProviderConfig::Grok {
            model,
            api_key,
            endpoint,
            ..
        }
        | LlmProviderConfig::Perplexity {
            model,
            api_key,
            endpoint,
            ..
        } => ChatCompletions::new(endpoint, api_key.clone(), model.clone()),
    }
}

/// Pull the configured sampling knobs out of any provider variant.
pub fn sampling_defaults(config: &LlmProviderConfig) -> (Option<f32>, Option<u32>) {
    match config {
        LlmProviderConfig::Openai {
            temperature,
            max_tokens,
            ..
        }
        | LlmProviderConfig::Grok {
            temperature,
            max_tokens,
            ..
        }
        | LlmProviderConfig::Perplexity {
            temperature,
            max_tokens,
            ..
        } => (*temperature, *max_tokens),
    }
}
