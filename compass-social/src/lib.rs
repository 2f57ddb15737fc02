//! Client for the X (Twitter) v2 API with Compass defaults.
//!
//! Handles auth, request parameter shaping, and user/timeline lookups
//! before delegating to the shared HTTP client. Pagination (`next_token`)
//! is not implemented; the classifier only ever wants the most recent page.

pub mod x;

pub use x::client::XApi;
pub use x::types::{Post, User};
pub use x::SocialError;
