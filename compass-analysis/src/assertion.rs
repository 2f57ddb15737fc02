//! Extraction of discrete factual claims from the belief lists.
//!
//! The model is asked for a strict JSON array, but older prompts used a
//! labelled markdown listing and models still drift back to it, so the
//! parser accepts either shape: strict JSON first, then per-segment regex
//! extraction with per-field defaults. Malformed segments are discarded
//! individually; a partial list is a normal, non-error outcome.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::based::Belief;
use crate::classify::clamp_unit;
use crate::parse::{array_window, strip_code_fences, FallbackParser, Outcome};

pub const DEFAULT_ASSERTION_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assertion {
    pub statement: String,
    #[serde(default)]
    pub is_fact_checkable: bool,
    #[serde(default = "default_confidence")]
    pub model_confidence: f64,
    #[serde(default = "default_confidence")]
    pub user_confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_context: Option<String>,
}

fn default_confidence() -> f64 {
    DEFAULT_ASSERTION_CONFIDENCE
}

/// Ask for checkable claims distilled from both belief lists.
pub fn extraction_prompt(mainstream: &[Belief], contrarian: &[Belief]) -> String {
    let mut beliefs = String::new();
    for b in mainstream.iter().chain(contrarian) {
        beliefs.push_str(&format!("- {}\n", b.belief));
    }

    format!(
        r#"Below are belief statements attributed to one author. Extract the
discrete factual assertions they contain. A factual assertion is an
empirically verifiable claim, not a value judgment.

Beliefs:
{beliefs}
Respond with a JSON array only, one object per assertion:

[
  {{
    "statement": "inflation exceeded 8% in 2022",
    "isFactCheckable": true,
    "modelConfidence": 0.9,
    "userConfidence": 0.8,
    "sourceContext": "stated while arguing about fiscal policy"
  }}
]

modelConfidence is your confidence the statement is accurate;
userConfidence is how strongly the author appears to hold it. Both are in
[0,1]."#
    )
}

fn segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)assertion\s+\d+\s*:").expect("segment regex"))
}

fn field_res() -> &'static [(&'static str, Regex); 5] {
    static RES: OnceLock<[(&'static str, Regex); 5]> = OnceLock::new();
    RES.get_or_init(|| {
        let re = |p| Regex::new(p).expect("field regex");
        [
            ("statement", re(r"(?im)^\s*statement\s*:\s*(.+)$")),
            ("checkable", re(r"(?im)^\s*fact-?checkable\s*:\s*(\S+)")),
            (
                "model",
                re(r"(?im)^\s*model\s+confidence\s*:\s*([0-9]*\.?[0-9]+)"),
            ),
            (
                "user",
                re(r"(?im)^\s*user\s+confidence\s*:\s*([0-9]*\.?[0-9]+)"),
            ),
            ("context", re(r"(?im)^\s*context\s*:\s*(.+)$")),
        ]
    })
}

fn capture<'t>(name: &str, segment: &'t str) -> Option<&'t str> {
    let (_, re) = field_res().iter().find(|(n, _)| *n == name)?;
    re.captures(segment)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

fn parse_segment(segment: &str) -> Option<Assertion> {
    let statement = match capture("statement", segment) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => {
            tracing::warn!(
                segment = %segment.chars().take(120).collect::<String>(),
                "assertion.segment_missing_statement"
            );
            return None;
        }
    };

    let is_fact_checkable = capture("checkable", segment)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "yes" | "true"))
        .unwrap_or(false);

    let confidence = |name: &str| {
        capture(name, segment)
            .and_then(|v| v.parse::<f64>().ok())
            .map(clamp_unit)
            .unwrap_or(DEFAULT_ASSERTION_CONFIDENCE)
    };

    Some(Assertion {
        statement,
        is_fact_checkable,
        model_confidence: confidence("model"),
        user_confidence: confidence("user"),
        source_context: capture("context", segment).map(|s| s.to_string()),
    })
}

/// Parse the extraction reply, strict JSON first, markdown listing second.
/// Returns however many assertions survived; an empty list is not an error.
pub fn parse_assertions(text: &str) -> Vec<Assertion> {
    let parser = FallbackParser::new()
        .stage("json-array", |s: &str| {
            let stripped = strip_code_fences(s);
            let candidate = array_window(stripped).unwrap_or(stripped);
            let mut parsed = serde_json::from_str::<Vec<Assertion>>(candidate)
                .map_err(|e| e.to_string())?;
            for a in &mut parsed {
                a.model_confidence = clamp_unit(a.model_confidence);
                a.user_confidence = clamp_unit(a.user_confidence);
            }
            parsed.retain(|a| !a.statement.trim().is_empty());
            Ok(parsed)
        })
        .stage("markdown-listing", |s: &str| {
            let segments: Vec<&str> = segment_re().split(s).skip(1).collect();
            if segments.is_empty() {
                return Err("no labelled segments".to_string());
            }
            let parsed: Vec<Assertion> =
                segments.iter().filter_map(|seg| parse_segment(seg)).collect();
            tracing::debug!(
                segments = segments.len(),
                parsed = parsed.len(),
                "assertion.markdown_fallback"
            );
            Ok(parsed)
        });

    match parser.parse(text) {
        Outcome::Parsed(assertions) => assertions,
        Outcome::Unparseable(reason) => {
            tracing::warn!(reason = %reason, "assertion.reply_unparseable");
            Vec::new()
        }
    }
}
