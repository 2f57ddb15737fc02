//! Classification result shape and the total normalizer.
//!
//! The normalizer accepts whatever subset of fields the model managed to
//! produce and always returns a fully-populated result: absent strings
//! become "unknown"/"", absent numbers become 0.0, absent arrays become
//! empty, and every score is clamped to its declared range before it can
//! leave this module.

use serde::{Deserialize, Serialize};

use crate::parse::{object_window, strip_code_fences, FallbackParser, Outcome};

pub const UNKNOWN_CATEGORY: &str = "unknown";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoreComponents {
    pub conviction: f64,
    pub authenticity: f64,
    pub intellectual_rigor: f64,
    pub contrarian: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassificationResult {
    pub category: String,
    pub confidence: f64,
    pub key_indicators: Vec<String>,
    pub secondary_influences: Vec<String>,
    pub language_patterns: Vec<String>,
    pub conviction: f64,
    pub based_score: f64,
    pub score_components: ScoreComponents,
}

/// Partially-typed mirror of the reply; every field optional so a sparse
/// or sloppy reply still decodes.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawClassification {
    pub category: Option<String>,
    pub confidence: Option<f64>,
    pub key_indicators: Option<Vec<String>>,
    pub secondary_influences: Option<Vec<String>>,
    pub language_patterns: Option<Vec<String>>,
    pub conviction: Option<f64>,
    pub based_score: Option<f64>,
    pub score_components: Option<RawScoreComponents>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawScoreComponents {
    pub conviction: Option<f64>,
    pub authenticity: Option<f64>,
    pub intellectual_rigor: Option<f64>,
    pub contrarian: Option<f64>,
}

/// Clamp to [0,1]; non-finite collapses to 0.
pub fn clamp_unit(x: f64) -> f64 {
    if x.is_finite() {
        x.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Clamp to [0,100]; non-finite collapses to 0.
pub fn clamp_percent(x: f64) -> f64 {
    if x.is_finite() {
        x.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Merge defaults over a partial reply. Total: returns a fully-populated
/// result for any input.
pub fn normalize(raw: RawClassification) -> ClassificationResult {
    let conviction = clamp_unit(raw.conviction.unwrap_or(0.0));

    // A missing or zero based_score is derived from conviction when we
    // have one; conviction is already clamped so the product stays in range.
    let based_score = match raw.based_score {
        Some(score) if score.is_finite() && score != 0.0 => clamp_percent(score),
        _ => conviction * 100.0,
    };

    let components = raw.score_components.unwrap_or_default();

    ClassificationResult {
        category: raw
            .category
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string()),
        confidence: clamp_unit(raw.confidence.unwrap_or(0.0)),
        key_indicators: raw.key_indicators.unwrap_or_default(),
        secondary_influences: raw.secondary_influences.unwrap_or_default(),
        language_patterns: raw.language_patterns.unwrap_or_default(),
        conviction,
        based_score,
        score_components: ScoreComponents {
            conviction: clamp_percent(components.conviction.unwrap_or(0.0)),
            authenticity: clamp_percent(components.authenticity.unwrap_or(0.0)),
            intellectual_rigor: clamp_percent(components.intellectual_rigor.unwrap_or(0.0)),
            contrarian: clamp_percent(components.contrarian.unwrap_or(0.0)),
        },
    }
}

/// Decode the model's reply text into a normalized result. Unparseable
/// text degrades to the all-defaults result rather than an error.
pub fn parse_classification(text: &str) -> ClassificationResult {
    let parser = FallbackParser::new()
        .stage("strict", |s: &str| {
            serde_json::from_str::<RawClassification>(strip_code_fences(s))
                .map_err(|e| e.to_string())
        })
        .stage("object-window", |s: &str| {
            let window = object_window(s).ok_or("no object found")?;
            serde_json::from_str::<RawClassification>(window).map_err(|e| e.to_string())
        });

    match parser.parse(text) {
        Outcome::Parsed(raw) => normalize(raw),
        Outcome::Unparseable(reason) => {
            tracing::warn!(reason = %reason, "classify.reply_unparseable");
            normalize(RawClassification::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_every_field_for_empty_input() {
        let result = normalize(RawClassification::default());
        assert_eq!(result.category, "unknown");
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.based_score, 0.0);
        assert!(result.key_indicators.is_empty());
        assert!(result.secondary_influences.is_empty());
        assert!(result.language_patterns.is_empty());
    }

    #[test]
    fn clamps_confidence_into_unit_range() {
        for (input, expected) in [(1.7, 1.0), (-0.3, 0.0), (f64::NAN, 0.0), (0.42, 0.42)] {
            let result = normalize(RawClassification {
                confidence: Some(input),
                ..Default::default()
            });
            assert_eq!(result.confidence, expected, "input {input}");
        }
    }

    #[test]
    fn derives_based_score_from_conviction() {
        let result = normalize(RawClassification {
            conviction: Some(0.8),
            ..Default::default()
        });
        assert_eq!(result.based_score, 80.0);
        assert_eq!(result.conviction, 0.8);
    }

    #[test]
    fn explicit_based_score_wins_over_derivation() {
        let result = normalize(RawClassification {
            conviction: Some(0.8),
            based_score: Some(55.0),
            ..Default::default()
        });
        assert_eq!(result.based_score, 55.0);
    }

    #[test]
    fn zero_based_score_is_treated_as_absent() {
        let result = normalize(RawClassification {
            conviction: Some(0.5),
            based_score: Some(0.0),
            ..Default::default()
        });
        assert_eq!(result.based_score, 50.0);
    }

    #[test]
    fn out_of_range_components_are_clamped() {
        let result = normalize(RawClassification {
            score_components: Some(RawScoreComponents {
                conviction: Some(140.0),
                authenticity: Some(-5.0),
                intellectual_rigor: Some(f64::NAN),
                contrarian: Some(66.0),
            }),
            ..Default::default()
        });
        assert_eq!(result.score_components.conviction, 100.0);
        assert_eq!(result.score_components.authenticity, 0.0);
        assert_eq!(result.score_components.intellectual_rigor, 0.0);
        assert_eq!(result.score_components.contrarian, 66.0);
    }

    #[test]
    fn parses_fenced_reply() {
        let text = "```json\n{\"category\": \"libertarian\", \"confidence\": 0.9}\n```";
        let result = parse_classification(text);
        assert_eq!(result.category, "libertarian");
        assert_eq!(result.confidence, 0.9);
    }

    #[test]
    fn parses_reply_with_surrounding_prose() {
        let text = "Sure, here is the classification:\n{\"category\": \"centrist\"}\nLet me know!";
        assert_eq!(parse_classification(text).category, "centrist");
    }

    #[test]
    fn unparseable_reply_degrades_to_defaults() {
        let result = parse_classification("I cannot classify this user.");
        assert_eq!(result.category, "unknown");
        assert_eq!(result.based_score, 0.0);
    }
}
