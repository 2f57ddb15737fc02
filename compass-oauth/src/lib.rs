//! OAuth2 authorization-code flow with PKCE against the X endpoints.
//!
//! The state machine is INIT → AWAITING_CALLBACK → EXCHANGED → REFRESHED*:
//! [`PkceFlow::begin`] mints state + verifier and persists them with a
//! 10-minute TTL, [`PkceFlow::callback`] consumes the state record
//! atomically with the lookup (a replayed callback inside the TTL window is
//! rejected) and exchanges the code, [`PkceFlow::refresh`] rotates the
//! stored token pair and leaves the old record untouched on failure.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use compass_http::{Auth, HttpClient, RequestOpts};
use compass_store::{SessionStore, StateRecord, StoreError, TokenRecord};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

/// Single-use state records expire this many seconds after `begin`.
pub const STATE_TTL_SECS: i64 = 600;

const STATE_LEN: usize = 32;
// RFC 7636 wants 43..=128 chars from the unreserved set.
const VERIFIER_LEN: usize = 64;

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorizeTicket {
    pub url: String,
    pub state: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

fn default_expires_in() -> u64 {
    7200
}

#[derive(thiserror::Error, Debug)]
pub enum OAuthError {
    #[error("missing code or state parameter")]
    MissingParams,

    /// State absent, already consumed, or past its TTL. Raised before any
    /// token-endpoint call is made.
    #[error("unknown or expired state")]
    UnknownState,

    #[error("no stored token record")]
    NoTokens,

    #[error("stored token record has no refresh token")]
    NoRefreshToken,

    #[error("token endpoint rejected the request: {0}")]
    Exchange(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid OAuth configuration: {0}")]
    Config(String),
}

pub struct PkceFlow {
    config: OAuthConfig,
    store: Arc<dyn SessionStore>,
    http: HttpClient,
    token_path: String,
}

impl PkceFlow {
    pub fn new(config: OAuthConfig, store: Arc<dyn SessionStore>) -> Result<Self, OAuthError> {
        let token_url = Url::parse(&config.token_url)
            .map_err(|e| OAuthError::Config(format!("bad token_url: {e}")))?;
        let origin = token_url[..url::Position::BeforePath].to_string();
        let token_path = token_url.path().trim_start_matches('/').to_string();
        let http = HttpClient::new(&origin)
            .map_err(|e| OAuthError::Config(format!("bad token_url origin: {e}")))?;
        Ok(Self {
            config,
            store,
            http,
            token_path,
        })
    }

    /// Mint state + PKCE verifier, persist them, and produce the
    /// authorization URL the user should be redirected to.
    pub async fn begin(&self) -> Result<AuthorizeTicket, OAuthError> {
        let state = random_urlsafe(STATE_LEN);
        let code_verifier = random_urlsafe(VERIFIER_LEN);
        let code_challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes()));

        self.store
            .put_state(StateRecord {
                state: state.clone(),
                code_verifier,
                expires_at: Utc::now() + Duration::seconds(STATE_TTL_SECS),
            })
            .await?;

        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| OAuthError::Config(format!("bad auth_url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", &state)
            .append_pair("code_challenge", &code_challenge)
            .append_pair("code_challenge_method", "S256");

        tracing::info!(state = %state, "oauth.begin");
        Ok(AuthorizeTicket {
            url: url.into(),
            state,
            expires_in: STATE_TTL_SECS as u64,
        })
    }

    /// Exchange the callback's code for tokens. The stored state record is
    /// consumed before the token endpoint is contacted.
    pub async fn callback(&self, code: &str, state: &str) -> Result<TokenResponse, OAuthError> {
        if code.is_empty() || state.is_empty() {
            return Err(OAuthError::MissingParams);
        }

        let record = self
            .store
            .take_state(state)
            .await?
            .ok_or(OAuthError::UnknownState)?;

        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.config.redirect_uri),
            ("code_verifier", &record.code_verifier),
            ("client_id", &self.config.client_id),
        ];
        let tokens = self.token_request(&form).await?;
        self.persist(&tokens, None).await?;

        tracing::info!(state = %state, "oauth.callback.exchanged");
        Ok(tokens)
    }

    /// Rotate the stored token pair. On failure the old record remains
    /// valid until its declared expiry.
    pub async fn refresh(&self) -> Result<TokenResponse, OAuthError> {
        let current = self.store.get_tokens().await?.ok_or(OAuthError::NoTokens)?;
        let refresh_token = current
            .refresh_token
            .clone()
            .ok_or(OAuthError::NoRefreshToken)?;

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", &refresh_token),
            ("client_id", &self.config.client_id),
        ];
        let tokens = self.token_request(&form).await?;

        // Some providers omit the refresh token on rotation; keep the old one.
        self.persist(&tokens, Some(refresh_token)).await?;

        tracing::info!("oauth.refreshed");
        Ok(tokens)
    }

    async fn token_request(
        &self,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, OAuthError> {
        let auth = match &self.config.client_secret {
            Some(secret) => Auth::Basic {
                user: &self.config.client_id,
                secret,
            },
            None => Auth::None,
        };

        self.http
            .post_form(
                &self.token_path,
                form,
                RequestOpts {
                    auth: Some(auth),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| OAuthError::Exchange(e.to_string()))
    }

    async fn persist(
        &self,
        tokens: &TokenResponse,
        fallback_refresh: Option<String>,
    ) -> Result<(), StoreError> {
        self.store
            .put_tokens(TokenRecord {
                access_token: tokens.access_token.clone(),
                refresh_token: tokens.refresh_token.clone().or(fallback_refresh),
                expires_at: Utc::now() + Duration::seconds(tokens.expires_in as i64),
            })
            .await
    }
}

fn random_urlsafe(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifier_length_satisfies_rfc_7636() {
        let v = random_urlsafe(VERIFIER_LEN);
        assert!((43..=128).contains(&v.len()));
        assert!(v.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn challenge_is_base64url_of_sha256() {
        // Appendix B of RFC 7636.
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }
}
