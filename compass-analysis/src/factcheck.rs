//! Fact-checking of extracted assertions through a search-augmented model.
//!
//! Each checkable assertion gets one retried completion asking for a rigid
//! plaintext block. A reply is accepted only when determination,
//! confidence, explanation, and at least one source are all present;
//! otherwise the check is dropped with a warning and never retried.

use std::time::Duration;

use compass_llm::traits::{CompletionRequest, LlmClient};
use serde::Serialize;
use tokio::time::sleep;

use crate::assertion::Assertion;
use crate::based::{Belief, NEUTRAL_SCORE};
use crate::classify::clamp_unit;

/// Attempts per assertion (the backoff between them is `2^attempt` seconds).
const CHECK_ATTEMPTS: u32 = 3;

/// Weight applied to checks whose statement echoes a mainstream belief;
/// everything else gets [`CONTRARIAN_WEIGHT`].
const MAINSTREAM_WEIGHT: f64 = 1.2;
const CONTRARIAN_WEIGHT: f64 = 0.8;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FactCheckResult {
    pub statement: String,
    pub is_true: bool,
    pub confidence: f64,
    pub explanation: String,
    pub sources: Vec<String>,
}

pub fn fact_check_prompt(statement: &str) -> String {
    format!(
        r#"Fact-check the following claim using current web sources:

"{statement}"

Answer in exactly this plaintext format, nothing else:

Determination: true or false
Confidence: a number between 0 and 1
Explanation: one or two sentences
Sources:
- first source URL or citation
- second source URL or citation"#
    )
}

fn label_value<'t>(line: &'t str, label: &str) -> Option<&'t str> {
    let trimmed = line.trim();
    let head = trimmed.get(..label.len())?;
    if !head.eq_ignore_ascii_case(label) {
        return None;
    }
    Some(trimmed[label.len()..].trim())
}

/// Parse the rigid plaintext block. Returns `None` (with a warning) unless
/// every required part is present.
pub fn parse_fact_check(statement: &str, text: &str) -> Option<FactCheckResult> {
    let mut determination: Option<bool> = None;
    let mut confidence: Option<f64> = None;
    let mut explanation: Option<String> = None;
    let mut in_sources = false;
    let mut sources = Vec::new();

    for line in text.lines() {
        if let Some(v) = label_value(line, "determination:") {
            let v = v.to_ascii_lowercase();
            determination = if v.starts_with("true") {
                Some(true)
            } else if v.starts_with("false") {
                Some(false)
            } else {
                None
            };
            in_sources = false;
        } else if let Some(v) = label_value(line, "confidence:") {
            confidence = v
                .trim_end_matches('%')
                .parse::<f64>()
                .ok()
                .map(|n| clamp_unit(if n > 1.0 { n / 100.0 } else { n }));
            in_sources = false;
        } else if let Some(v) = label_value(line, "explanation:") {
            if !v.is_empty() {
                explanation = Some(v.to_string());
            }
            in_sources = false;
        } else if label_value(line, "sources:").is_some() {
            in_sources = true;
        } else if in_sources {
            let trimmed = line.trim();
            if let Some(src) = trimmed.strip_prefix('-').or_else(|| trimmed.strip_prefix('*')) {
                let src = src.trim();
                if !src.is_empty() {
                    sources.push(src.to_string());
                }
            }
        }
    }

    match (determination, confidence, explanation) {
        (Some(is_true), Some(confidence), Some(explanation)) if !sources.is_empty() => {
            Some(FactCheckResult {
                statement: statement.to_string(),
                is_true,
                confidence,
                explanation,
                sources,
            })
        }
        _ => {
            tracing::warn!(
                statement = %statement,
                has_determination = determination.is_some(),
                has_confidence = confidence.is_some(),
                sources = sources.len(),
                "factcheck.reply_incomplete"
            );
            None
        }
    }
}

/// Run one assertion through the search-augmented model. Transport-level
/// failures are retried; an incomplete reply is dropped immediately.
pub async fn check_assertion(
    llm: &dyn LlmClient,
    assertion: &Assertion,
) -> Option<FactCheckResult> {
    let req = CompletionRequest::new(fact_check_prompt(&assertion.statement));

    for attempt in 0..CHECK_ATTEMPTS {
        match llm.complete(&req).await {
            Ok(text) => return parse_fact_check(&assertion.statement, &text),
            Err(err) => {
                tracing::warn!(
                    statement = %assertion.statement,
                    attempt,
                    error = %err,
                    "factcheck.request_failed"
                );
                if attempt + 1 < CHECK_ATTEMPTS {
                    sleep(Duration::from_secs(1u64 << attempt)).await;
                }
            }
        }
    }
    None
}

/// Aggregate successful checks into one 0–100 truthfulness score.
///
/// Checks echoing a mainstream belief weigh 1.2, others 0.8; a true check
/// contributes `confidence * 100 * weight`, a false one contributes 0. The
/// sum is divided by the check *count* rather than the weight sum, which
/// can push the raw value past 100; that overflow is clamped and logged
/// instead of surfaced.
pub fn aggregate_truthfulness(checks: &[FactCheckResult], mainstream: &[Belief]) -> f64 {
    if checks.is_empty() {
        return NEUTRAL_SCORE;
    }

    let sum: f64 = checks
        .iter()
        .map(|check| {
            if !check.is_true {
                return 0.0;
            }
            let weight = if mainstream
                .iter()
                .any(|b| b.belief.contains(&check.statement))
            {
                MAINSTREAM_WEIGHT
            } else {
                CONTRARIAN_WEIGHT
            };
            check.confidence * 100.0 * weight
        })
        .sum();

    let raw = sum / checks.len() as f64;
    if !(0.0..=100.0).contains(&raw) {
        tracing::warn!(raw, checks = checks.len(), "factcheck.aggregate_out_of_range");
    }
    raw.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(statement: &str, is_true: bool, confidence: f64) -> FactCheckResult {
        FactCheckResult {
            statement: statement.to_string(),
            is_true,
            confidence,
            explanation: "because".to_string(),
            sources: vec!["https://example.org".to_string()],
        }
    }

    fn belief(text: &str) -> Belief {
        Belief {
            belief: text.to_string(),
            justification: String::new(),
            confidence: 0.5,
            importance: 0.5,
        }
    }

    const GOOD_REPLY: &str = "Determination: true\n\
        Confidence: 0.9\n\
        Explanation: Multiple statistical agencies reported it.\n\
        Sources:\n\
        - https://example.org/cpi-2022\n\
        - https://example.org/bls";

    #[test]
    fn parses_complete_block() {
        let parsed = parse_fact_check("inflation exceeded 8% in 2022", GOOD_REPLY).unwrap();
        assert!(parsed.is_true);
        assert_eq!(parsed.confidence, 0.9);
        assert_eq!(parsed.sources.len(), 2);
    }

    #[test]
    fn labels_match_case_insensitively() {
        let reply = GOOD_REPLY
            .replace("Determination", "DETERMINATION")
            .replace("Sources", "sources");
        assert!(parse_fact_check("s", &reply).is_some());
    }

    #[test]
    fn percentage_confidence_is_normalised() {
        let reply = GOOD_REPLY.replace("Confidence: 0.9", "Confidence: 85%");
        let parsed = parse_fact_check("s", &reply).unwrap();
        assert_eq!(parsed.confidence, 0.85);
    }

    #[test]
    fn missing_sources_drops_the_check() {
        let reply = "Determination: false\nConfidence: 0.7\nExplanation: nope.";
        assert!(parse_fact_check("s", reply).is_none());
    }

    #[test]
    fn missing_determination_drops_the_check() {
        let reply = "Confidence: 0.7\nExplanation: unclear.\nSources:\n- somewhere";
        assert!(parse_fact_check("s", reply).is_none());
    }

    #[test]
    fn zero_checks_aggregate_to_neutral() {
        assert_eq!(aggregate_truthfulness(&[], &[]), NEUTRAL_SCORE);
    }

    #[test]
    fn mainstream_overflow_is_clamped_to_hundred() {
        // One true mainstream check with full confidence: raw value is
        // 1.0 * 100 * 1.2 / 1 = 120, surfaced as 100.
        let checks = vec![check("taxes fund services", true, 1.0)];
        let beliefs = vec![belief("taxes fund services and infrastructure")];
        assert_eq!(aggregate_truthfulness(&checks, &beliefs), 100.0);
    }

    #[test]
    fn false_checks_drag_the_mean_down() {
        let checks = vec![
            check("claim a", true, 0.5),
            check("claim b", false, 0.9),
        ];
        // 0.5*100*0.8 = 40 contributed, divided by 2 checks.
        assert_eq!(aggregate_truthfulness(&checks, &[]), 20.0);
    }
}
