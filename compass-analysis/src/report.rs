//! The end-to-end analysis pipeline: posts in, report out.

use std::sync::Arc;

use compass_common::{CompassError, Result};
use compass_llm::traits::{CompletionRequest, LlmClient, LlmError};
use serde::Serialize;

use crate::assertion::{extraction_prompt, parse_assertions};
use crate::based::{parse_based, BasedScore};
use crate::classify::{parse_classification, ClassificationResult};
use crate::factcheck::{aggregate_truthfulness, check_assertion, FactCheckResult};
use crate::prompt::{based_prompt, classification_prompt, ANALYST_SYSTEM_PROMPT};

#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub classification: ClassificationResult,
    pub based: BasedScore,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fact_checks: Vec<FactCheckResult>,
}

pub struct Analyzer {
    classifier: Arc<dyn LlmClient>,
    fact_checker: Option<Arc<dyn LlmClient>>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl Analyzer {
    pub fn new(classifier: Arc<dyn LlmClient>) -> Self {
        Self {
            classifier,
            fact_checker: None,
            temperature: Some(0.2),
            max_tokens: Some(1200),
        }
    }

    /// Enable the assertion/fact-check extension with a search-augmented
    /// provider.
    pub fn with_fact_checker(mut self, fact_checker: Arc<dyn LlmClient>) -> Self {
        self.fact_checker = Some(fact_checker);
        self
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature.or(self.temperature);
        self.max_tokens = max_tokens.or(self.max_tokens);
        self
    }

    fn request(&self, prompt: String) -> CompletionRequest {
        let mut req = CompletionRequest::new(prompt).with_system(ANALYST_SYSTEM_PROMPT);
        req.temperature = self.temperature;
        req.max_tokens = self.max_tokens;
        req
    }

    /// Run classification, the based-score judgment, and (when configured)
    /// fact-checking over the given post texts.
    pub async fn run(&self, post_texts: &[String]) -> Result<AnalysisReport> {
        let classification_reply = self
            .classifier
            .complete(&self.request(classification_prompt(post_texts)))
            .await
            .map_err(llm_to_common)?;
        let classification = parse_classification(&classification_reply);
        tracing::info!(
            category = %classification.category,
            confidence = classification.confidence,
            "analysis.classified"
        );

        let based_reply = self
            .classifier
            .complete(&self.request(based_prompt(post_texts)))
            .await
            .map_err(llm_to_common)?;
        let mut based = parse_based(&based_reply);

        let mut fact_checks = Vec::new();
        if let Some(fact_checker) = &self.fact_checker {
            // When the extension runs, the aggregate replaces the model's
            // own truthfulness guess (neutral 50 if nothing checked out).
            if let Some(checks) = self.run_fact_checks(fact_checker.as_ref(), &based).await? {
                based.truthfulness_score =
                    aggregate_truthfulness(&checks, &based.mainstream_beliefs);
                fact_checks = checks;
            }
        }

        Ok(AnalysisReport {
            classification,
            based,
            fact_checks,
        })
    }

    /// `None` means the extension had nothing to work with (no beliefs) and
    /// the model's own truthfulness score should stand.
    async fn run_fact_checks(
        &self,
        fact_checker: &dyn LlmClient,
        based: &BasedScore,
    ) -> Result<Option<Vec<FactCheckResult>>> {
        if based.mainstream_beliefs.is_empty() && based.contrarian_beliefs.is_empty() {
            return Ok(None);
        }

        let reply = self
            .classifier
            .complete(&self.request(extraction_prompt(
                &based.mainstream_beliefs,
                &based.contrarian_beliefs,
            )))
            .await
            .map_err(llm_to_common)?;
        let assertions = parse_assertions(&reply);

        let mut checks = Vec::new();
        for assertion in assertions.iter().filter(|a| a.is_fact_checkable) {
            if let Some(check) = check_assertion(fact_checker, assertion).await {
                checks.push(check);
            }
        }
        tracing::info!(
            assertions = assertions.len(),
            checked = checks.len(),
            "analysis.fact_checked"
        );
        Ok(Some(checks))
    }
}

fn llm_to_common(e: LlmError) -> CompassError {
    match e {
        LlmError::Transport(msg) => CompassError::Transport(msg),
        LlmError::Api { status, message } => {
            CompassError::Transport(format!("provider status {status}: {message}"))
        }
        LlmError::Malformed(msg) => CompassError::MalformedResponse(msg),
        LlmError::RetryExhausted { attempts, last } => CompassError::RetryExhausted {
            attempts,
            last: last.to_string(),
        },
        LlmError::Config(msg) => CompassError::Config(msg),
    }
}
