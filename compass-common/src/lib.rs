//! Common types and utilities shared across Compass crates.
//!
//! This crate defines the shared error taxonomy, observability helpers, and
//! the retry backoff schedule used by every outbound call site. It is
//! intentionally lightweight and dependency-minimal so that all crates can
//! depend on it without introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`CompassError`] and [`Result`]: shared error handling
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`retry`]: the jittered exponential backoff schedule

pub mod observability;
pub mod retry;

/// Error taxonomy used across the Compass system.
///
/// Handlers map these onto HTTP statuses at the response boundary:
/// `Validation` and `State` become 400-class responses, `NotFound` becomes
/// 404, everything else becomes 500.
#[derive(thiserror::Error, Debug)]
pub enum CompassError {
    /// Network or HTTP-status failure calling an upstream service.
    #[error("transport error: {0}")]
    Transport(String),

    /// An upstream returned an unparseable or schema-violating payload.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Caller input was missing or invalid.
    #[error("validation error: {0}")]
    Validation(String),

    /// An OAuth state record was missing, already consumed, or expired.
    #[error("state error: {0}")]
    State(String),

    /// A resource referenced by the caller does not exist upstream.
    #[error("not found: {0}")]
    NotFound(String),

    /// All retry attempts failed; carries the final underlying error.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetryExhausted { attempts: usize, last: String },

    /// Configuration was incomplete or invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenient alias for results that use [`CompassError`].
pub type Result<T> = std::result::Result<T, CompassError>;
