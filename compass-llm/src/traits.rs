use async_trait::async_trait;

/// A single non-streaming completion request. Providers decide how the
/// system prompt is carried on the wire.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    /// Network-level failure before any provider response arrived.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The provider answered with a non-2xx status.
    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The body was not parseable JSON or the expected `choices` path was
    /// missing.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// All gateway attempts failed; carries the final underlying error.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetryExhausted {
        attempts: usize,
        #[source]
        last: Box<LlmError>,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Whether a retry could plausibly help.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Transport(_) => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Narrow provider interface: one prompt in, one text reply out.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, req: &CompletionRequest) -> Result<String, LlmError>;

    /// The model name requests are issued against.
    fn model_name(&self) -> &str;
}
