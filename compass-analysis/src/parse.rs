//! Fallback-ordered parsing of free-form model output.
//!
//! Model replies arrive as text that is *usually* the JSON we asked for,
//! but often wrapped in code fences or prose. Instead of nested try/catch,
//! each reader is a named stage tried in a fixed order; the result is a
//! tagged [`Outcome`] so callers decide what a total failure means.

use std::sync::OnceLock;

use regex::Regex;

/// Result of running a [`FallbackParser`].
#[derive(Debug)]
pub enum Outcome<T> {
    Parsed(T),
    /// No stage succeeded; carries one reason per stage, in order.
    Unparseable(String),
}

impl<T> Outcome<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Parsed(v) => Some(v),
            Outcome::Unparseable(_) => None,
        }
    }
}

type StageFn<T> = Box<dyn Fn(&str) -> Result<T, String> + Send + Sync>;

pub struct FallbackParser<T> {
    stages: Vec<(&'static str, StageFn<T>)>,
}

impl<T> Default for FallbackParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FallbackParser<T> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn stage(
        mut self,
        name: &'static str,
        f: impl Fn(&str) -> Result<T, String> + Send + Sync + 'static,
    ) -> Self {
        self.stages.push((name, Box::new(f)));
        self
    }

    pub fn parse(&self, input: &str) -> Outcome<T> {
        let mut reasons = Vec::with_capacity(self.stages.len());
        for (name, f) in &self.stages {
            match f(input) {
                Ok(v) => return Outcome::Parsed(v),
                Err(reason) => reasons.push(format!("{name}: {reason}")),
            }
        }
        Outcome::Unparseable(reasons.join("; "))
    }
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("fence regex"))
}

/// Unwrap a ```json fenced block if present, otherwise return the trimmed
/// input unchanged.
pub fn strip_code_fences(text: &str) -> &str {
    match fence_re().captures(text) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(text),
        None => text.trim(),
    }
}

/// The widest `{ ... }` window, for replies with prose around the object.
pub fn object_window(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// The widest `[ ... ]` window, for replies with prose around the array.
pub fn array_window(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}
