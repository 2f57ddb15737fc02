//! Core analysis pipeline: prompts, parsing, validation, and scoring.
//!
//! This crate owns everything between "here are a user's recent posts" and
//! "here is the structured judgment": the classification prompt and its
//! total normalizer, the richer based-score judgment with per-field score
//! validation, dual-format assertion extraction, and the fact-check
//! aggregation. All model output handling is best-effort: sparse or
//! malformed replies degrade to defaults instead of failing a request.

pub mod assertion;
pub mod based;
pub mod category;
pub mod classify;
pub mod factcheck;
pub mod parse;
pub mod prompt;
pub mod report;

pub use assertion::Assertion;
pub use based::{BasedScore, Belief, TribalAffiliation};
pub use classify::{ClassificationResult, ScoreComponents};
pub use factcheck::FactCheckResult;
pub use report::{AnalysisReport, Analyzer};
