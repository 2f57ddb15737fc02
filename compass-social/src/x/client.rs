//! Thin wrapper around the X v2 user and timeline endpoints.

use std::borrow::Cow;

use compass_http::{Auth, HttpClient, RequestOpts};

use crate::x::types::{Post, TimelineResponse, User, UserResponse};
use crate::x::SocialError;

const X_API_BASE: &str = "https://api.twitter.com";
const POST_FIELDS: &str = "created_at,author_id,conversation_id";

#[derive(Clone)]
pub struct XApi {
    http: HttpClient,
    bearer: String,
}

impl XApi {
    /// Create a client against the production API. `bearer` is either the
    /// app-only bearer token or a user access token from the OAuth flow.
    pub fn new(bearer: String) -> Result<Self, SocialError> {
        Ok(Self {
            http: HttpClient::new(X_API_BASE)?,
            bearer,
        })
    }

    /// Create a client against an alternate base URL (tests).
    pub fn with_base(base: &str, bearer: String) -> Result<Self, SocialError> {
        Ok(Self {
            http: HttpClient::new(base)?,
            bearer,
        })
    }

    /// Resolve a username (handle without `@`) to a user record.
    pub async fn user_by_username(&self, username: &str) -> Result<User, SocialError> {
        let handle = username.trim_start_matches('@');
        let resp: UserResponse = self
            .http
            .get_json(
                &format!("2/users/by/username/{handle}"),
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.bearer)),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    SocialError::UserNotFound(handle.to_string())
                } else {
                    SocialError::Http(e)
                }
            })?;

        match resp.data {
            Some(user) => Ok(user),
            // The API reports unknown handles as 200 + an errors array.
            None => {
                tracing::debug!(username = %handle, errors = ?resp.errors, "x.user.missing");
                Err(SocialError::UserNotFound(handle.to_string()))
            }
        }
    }

    /// The user the current access token belongs to.
    pub async fn me(&self) -> Result<User, SocialError> {
        let resp: UserResponse = self
            .http
            .get_json(
                "2/users/me",
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.bearer)),
                    ..Default::default()
                },
            )
            .await?;

        resp.data
            .ok_or_else(|| SocialError::UserNotFound("me".to_string()))
    }

    /// Fetch a user's most recent posts, newest first.
    pub async fn recent_posts(&self, user_id: &str, max: u32) -> Result<Vec<Post>, SocialError> {
        // Timeline endpoint constraint: max_results must sit in 5..=100.
        let max_results = max.clamp(5, 100);

        let params: Vec<(&str, Cow<'_, str>)> = vec![
            ("max_results", max_results.to_string().into()),
            ("tweet.fields", POST_FIELDS.into()),
        ];

        let resp: TimelineResponse = self
            .http
            .get_json(
                &format!("2/users/{user_id}/tweets"),
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.bearer)),
                    query: Some(params),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    SocialError::UserNotFound(user_id.to_string())
                } else {
                    SocialError::Http(e)
                }
            })?;

        let posts = resp.data.unwrap_or_default();
        tracing::debug!(
            user_id = %user_id,
            requested = max_results,
            fetched = posts.len(),
            "x.timeline.fetched"
        );
        Ok(posts)
    }
}
