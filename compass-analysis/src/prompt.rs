//! Prompt rendering for the classification and based-score judgments.
//!
//! Pure functions of their inputs: the post list (capped to the most recent
//! [`MAX_PROMPT_POSTS`]) and the static taxonomy. Post texts are trusted as
//! opaque strings; the only escaping is JSON stringification of the array.

use crate::category::TAXONOMY;

/// Posts beyond this many are dropped from the prompt, newest first.
pub const MAX_PROMPT_POSTS: usize = 20;

pub const ANALYST_SYSTEM_PROMPT: &str = "You are a political discourse analyst. You judge only \
what is in the provided posts, you never invent biographical facts, and you answer with the \
exact JSON shape requested and nothing else.";

fn render_taxonomy() -> String {
    let mut out = String::new();
    for cat in TAXONOMY {
        out.push_str(&format!(
            "- {}: {}\n  language markers: {}\n  typical beliefs: {}\n  cultural signifiers: {}\n  hashtags: {}\n",
            cat.name,
            cat.description,
            cat.language_markers.join(", "),
            cat.beliefs.join("; "),
            cat.cultural_signifiers.join(", "),
            cat.hashtags.join(" "),
        ));
    }
    out
}

fn posts_json(texts: &[String]) -> String {
    let capped: Vec<&String> = texts.iter().take(MAX_PROMPT_POSTS).collect();
    serde_json::to_string_pretty(&capped).unwrap_or_else(|_| "[]".to_string())
}

/// The main classification instruction block, embedding a literal example
/// of the expected JSON shape.
pub fn classification_prompt(texts: &[String]) -> String {
    format!(
        r#"Classify the author of the following posts into exactly one of these categories:

{taxonomy}
Posts (most recent first, JSON array):
{posts}

Respond with a single JSON object matching this example exactly (no code
fences, no commentary):

{{
  "category": "libertarian",
  "confidence": 0.82,
  "key_indicators": ["repeated references to fiat debasement"],
  "secondary_influences": ["populist_right"],
  "language_patterns": ["first-principles framing"],
  "conviction": 0.9,
  "based_score": 74,
  "score_components": {{
    "conviction": 90,
    "authenticity": 70,
    "intellectual_rigor": 65,
    "contrarian": 72
  }}
}}

confidence and conviction are in [0,1]; based_score and every component are
in [0,100]."#,
        taxonomy = render_taxonomy(),
        posts = posts_json(texts),
    )
}

/// The richer based-score judgment, with per-belief structure.
pub fn based_prompt(texts: &[String]) -> String {
    format!(
        r#"Read the following posts and produce a structured judgment of the
author's independent thinking.

Posts (most recent first, JSON array):
{posts}

Respond with a single JSON object matching this example exactly (no code
fences, no commentary):

{{
  "tribal_affiliation": "populist_right",
  "justification": "one paragraph on the overall judgment",
  "contrarian_beliefs": [
    {{"belief": "...", "justification": "...", "confidence": 0.8, "importance": 0.6}}
  ],
  "mainstream_beliefs": [
    {{"belief": "...", "justification": "...", "confidence": 0.9, "importance": 0.4}}
  ],
  "based_score": 61,
  "sincerity_score": 74,
  "truthfulness_score": 55,
  "conspiracy_score": 32
}}

tribal_affiliation is one of: progressive_left, establishment_liberal,
centrist, libertarian, conservative_right, populist_right, unknown.
belief confidence and importance are in [0,1]; the four top-level scores
are in [0,100]."#,
        posts = posts_json(texts),
    )
}
