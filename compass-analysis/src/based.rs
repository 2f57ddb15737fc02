//! The richer based-score judgment and its score validation.
//!
//! The four top-level scores are validated independently: anything that is
//! not a finite number inside [0,100] is replaced with [`NEUTRAL_SCORE`]
//! and a warning names the offending field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classify::clamp_unit;
use crate::parse::{object_window, strip_code_fences, FallbackParser, Outcome};

/// Stand-in for a score the model failed to produce in range.
pub const NEUTRAL_SCORE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TribalAffiliation {
    ProgressiveLeft,
    EstablishmentLiberal,
    Centrist,
    Libertarian,
    ConservativeRight,
    PopulistRight,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Belief {
    pub belief: String,
    pub justification: String,
    pub confidence: f64,
    pub importance: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BasedScore {
    pub tribal_affiliation: TribalAffiliation,
    pub justification: String,
    pub contrarian_beliefs: Vec<Belief>,
    pub mainstream_beliefs: Vec<Belief>,
    pub based_score: f64,
    pub sincerity_score: f64,
    pub truthfulness_score: f64,
    pub conspiracy_score: f64,
}

/// Partially-typed mirror; scores stay as raw JSON values so a string or
/// null in one field doesn't sink the whole decode.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawBasedScore {
    pub tribal_affiliation: Option<TribalAffiliation>,
    pub justification: Option<String>,
    pub contrarian_beliefs: Option<Vec<RawBelief>>,
    pub mainstream_beliefs: Option<Vec<RawBelief>>,
    pub based_score: Option<Value>,
    pub sincerity_score: Option<Value>,
    pub truthfulness_score: Option<Value>,
    pub conspiracy_score: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawBelief {
    pub belief: Option<String>,
    pub justification: Option<String>,
    pub confidence: Option<f64>,
    pub importance: Option<f64>,
}

/// Validate a single top-level score: finite number in [0,100] passes
/// through, anything else becomes [`NEUTRAL_SCORE`] with a warning naming
/// the field. Absent fields default quietly.
pub fn validate_score(field: &str, value: Option<&Value>) -> f64 {
    let Some(value) = value else {
        return NEUTRAL_SCORE;
    };
    match value.as_f64() {
        Some(n) if n.is_finite() && (0.0..=100.0).contains(&n) => n,
        _ => {
            tracing::warn!(field, value = %value, "based.score_invalid");
            NEUTRAL_SCORE
        }
    }
}

fn normalize_beliefs(raw: Option<Vec<RawBelief>>) -> Vec<Belief> {
    raw.unwrap_or_default()
        .into_iter()
        .filter_map(|b| {
            let belief = b.belief.filter(|s| !s.trim().is_empty())?;
            Some(Belief {
                belief,
                justification: b.justification.unwrap_or_default(),
                confidence: clamp_unit(b.confidence.unwrap_or(0.5)),
                importance: clamp_unit(b.importance.unwrap_or(0.5)),
            })
        })
        .collect()
}

/// Merge defaults and validated scores over a partial reply.
pub fn validate_based(raw: RawBasedScore) -> BasedScore {
    BasedScore {
        tribal_affiliation: raw.tribal_affiliation.unwrap_or_default(),
        justification: raw.justification.unwrap_or_default(),
        contrarian_beliefs: normalize_beliefs(raw.contrarian_beliefs),
        mainstream_beliefs: normalize_beliefs(raw.mainstream_beliefs),
        based_score: validate_score("based_score", raw.based_score.as_ref()),
        sincerity_score: validate_score("sincerity_score", raw.sincerity_score.as_ref()),
        truthfulness_score: validate_score("truthfulness_score", raw.truthfulness_score.as_ref()),
        conspiracy_score: validate_score("conspiracy_score", raw.conspiracy_score.as_ref()),
    }
}

/// Decode the model's reply text into a validated judgment. Unparseable
/// text degrades to the all-neutral judgment rather than an error.
pub fn parse_based(text: &str) -> BasedScore {
    let parser = FallbackParser::new()
        .stage("strict", |s: &str| {
            serde_json::from_str::<RawBasedScore>(strip_code_fences(s)).map_err(|e| e.to_string())
        })
        .stage("object-window", |s: &str| {
            let window = object_window(s).ok_or("no object found")?;
            serde_json::from_str::<RawBasedScore>(window).map_err(|e| e.to_string())
        });

    match parser.parse(text) {
        Outcome::Parsed(raw) => validate_based(raw),
        Outcome::Unparseable(reason) => {
            tracing::warn!(reason = %reason, "based.reply_unparseable");
            validate_based(RawBasedScore::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_scores_pass_through() {
        assert_eq!(validate_score("based_score", Some(&json!(73.5))), 73.5);
        assert_eq!(validate_score("based_score", Some(&json!(0))), 0.0);
        assert_eq!(validate_score("based_score", Some(&json!(100))), 100.0);
    }

    #[test]
    fn invalid_scores_become_fifty() {
        for bad in [json!(-1), json!(100.1), json!("high"), json!(null), json!([1])] {
            assert_eq!(
                validate_score("sincerity_score", Some(&bad)),
                NEUTRAL_SCORE,
                "input {bad}"
            );
        }
        assert_eq!(validate_score("sincerity_score", None), NEUTRAL_SCORE);
    }

    #[test]
    fn unknown_affiliation_string_maps_to_unknown() {
        let raw: RawBasedScore = serde_json::from_str(
            r#"{"tribal_affiliation": "post_left", "based_score": 60}"#,
        )
        .unwrap();
        let based = validate_based(raw);
        assert_eq!(based.tribal_affiliation, TribalAffiliation::Unknown);
        assert_eq!(based.based_score, 60.0);
    }

    #[test]
    fn beliefs_without_text_are_dropped() {
        let raw: RawBasedScore = serde_json::from_str(
            r#"{
                "mainstream_beliefs": [
                    {"belief": "taxes fund services", "confidence": 2.0},
                    {"justification": "orphaned justification"}
                ]
            }"#,
        )
        .unwrap();
        let based = validate_based(raw);
        assert_eq!(based.mainstream_beliefs.len(), 1);
        assert_eq!(based.mainstream_beliefs[0].confidence, 1.0);
        assert_eq!(based.mainstream_beliefs[0].importance, 0.5);
    }

    #[test]
    fn string_score_does_not_sink_the_decode() {
        let based = parse_based(
            r#"{"tribal_affiliation": "centrist", "based_score": "seventy", "sincerity_score": 80}"#,
        );
        assert_eq!(based.tribal_affiliation, TribalAffiliation::Centrist);
        assert_eq!(based.based_score, NEUTRAL_SCORE);
        assert_eq!(based.sincerity_score, 80.0);
    }

    #[test]
    fn unparseable_reply_degrades_to_neutral() {
        let based = parse_based("no judgment today");
        assert_eq!(based.tribal_affiliation, TribalAffiliation::Unknown);
        assert_eq!(based.based_score, NEUTRAL_SCORE);
        assert!(based.mainstream_beliefs.is_empty());
    }
}
