pub mod client;
pub mod types;

use compass_http::HttpError;

#[derive(thiserror::Error, Debug)]
pub enum SocialError {
    /// The named user does not exist upstream (maps to HTTP 404 at the
    /// handler boundary).
    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("X API error: {0}")]
    Http(#[from] HttpError),
}
