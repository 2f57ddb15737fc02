//! Retry wrapper around any [`LlmClient`].
//!
//! Transient failures (network, 429, 5xx) are retried with jittered
//! exponential backoff; everything else propagates immediately. After the
//! attempt budget is spent the final error is wrapped in
//! [`LlmError::RetryExhausted`] rather than swallowed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use compass_common::retry::jittered_backoff;
use tokio::time::sleep;

use crate::traits::{CompletionRequest, LlmClient, LlmError};

const DEFAULT_ATTEMPTS: usize = 3;
const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(500);

pub struct RetryingLlm {
    inner: Arc<dyn LlmClient>,
    attempts: usize,
    backoff_base: Duration,
}

impl RetryingLlm {
    pub fn new(inner: Arc<dyn LlmClient>) -> Self {
        Self {
            inner,
            attempts: DEFAULT_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }

    /// Total attempts including the first (call sites historically ran 3–5).
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Shrink the backoff base in tests so retries don't sleep for real.
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }
}

#[async_trait]
impl LlmClient for RetryingLlm {
    async fn complete(&self, req: &CompletionRequest) -> Result<String, LlmError> {
        let mut attempt = 0usize;
        loop {
            match self.inner.complete(req).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_transient() && attempt + 1 < self.attempts => {
                    let delay = jittered_backoff(self.backoff_base, attempt as u32);
                    attempt += 1;
                    tracing::warn!(
                        model = %self.inner.model_name(),
                        attempt,
                        attempts = self.attempts,
                        backoff_ms = delay.as_millis() as u64,
                        error = %err,
                        "llm.gateway.retrying"
                    );
                    sleep(delay).await;
                }
                Err(err) if err.is_transient() => {
                    tracing::warn!(
                        model = %self.inner.model_name(),
                        attempts = self.attempts,
                        error = %err,
                        "llm.gateway.exhausted"
                    );
                    return Err(LlmError::RetryExhausted {
                        attempts: self.attempts,
                        last: Box::new(err),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
