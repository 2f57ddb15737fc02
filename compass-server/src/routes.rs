//! Request handlers for the Compass HTTP surface.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{header::LOCATION, StatusCode};
use axum::response::{IntoResponse, Response};
use compass_analysis::AnalysisReport;
use compass_llm::traits::CompletionRequest;
use compass_oauth::{AuthorizeTicket, TokenResponse};
use compass_social::XApi;
use serde::Deserialize;
use serde_json::Value;

use crate::app::AppState;
use crate::error::ApiError;

/// How many timeline posts to fetch; the prompt builder caps at the same
/// number anyway.
const TIMELINE_FETCH: u32 = 20;

const DIAG_PROMPT: &str = "Compass diagnostic ping. Reply with the single word: ok";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessRequest {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Fetch a user's recent posts, classify them, and return the report.
pub async fn process(
    State(state): State<AppState>,
    body: Option<Json<ProcessRequest>>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();

    // FIXME(rate-key): hash the key so raw access tokens never sit in the
    // limiter map.
    let rate_key = req
        .access_token
        .clone()
        .or_else(|| req.user_id.clone())
        .or_else(|| req.username.clone())
        .ok_or_else(|| {
            ApiError::bad_request(
                "invalid request",
                "userId, username, or accessToken is required",
            )
        })?;
    if !state.limiter.check(&rate_key) {
        return Err(ApiError::too_many_requests(
            "too many requests for this caller in the current window",
        ));
    }

    let (api, user_id) = match &req.access_token {
        Some(token) => {
            let api = XApi::with_base(&state.social_base, token.clone())?;
            let me = api.me().await?;
            (api, me.id)
        }
        None => {
            let api = XApi::with_base(&state.social_base, state.social_bearer.clone())?;
            let user_id = match (&req.user_id, &req.username) {
                (Some(id), _) => id.clone(),
                (None, Some(name)) => api.user_by_username(name).await?.id,
                (None, None) => unreachable!("rate_key guarantees one identifier"),
            };
            (api, user_id)
        }
    };

    let posts = api.recent_posts(&user_id, TIMELINE_FETCH).await?;
    tracing::info!(user_id = %user_id, posts = posts.len(), "process.fetched");

    let texts: Vec<String> = posts.into_iter().map(|p| p.text).collect();
    let report = state.analyzer.run(&texts).await?;
    Ok(Json(report))
}

fn oauth_flow(state: &AppState) -> Result<&compass_oauth::PkceFlow, ApiError> {
    state
        .oauth
        .as_deref()
        .ok_or_else(|| ApiError::internal("oauth error", "oauth is not configured"))
}

/// 302 to the provider's authorization page.
pub async fn oauth_request_token(State(state): State<AppState>) -> Result<Response, ApiError> {
    let ticket = oauth_flow(&state)?.begin().await?;
    Ok((
        StatusCode::FOUND,
        [(LOCATION, ticket.url)],
    )
        .into_response())
}

/// JSON variant of the same step, for clients that drive the redirect
/// themselves.
pub async fn oauth_init(State(state): State<AppState>) -> Result<Json<AuthorizeTicket>, ApiError> {
    Ok(Json(oauth_flow(&state)?.begin().await?))
}

pub async fn oauth_callback_get(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<TokenResponse>, ApiError> {
    exchange(&state, params).await
}

pub async fn oauth_callback_post(
    State(state): State<AppState>,
    body: Option<Json<CallbackParams>>,
) -> Result<Json<TokenResponse>, ApiError> {
    exchange(&state, body.map(|Json(p)| p).unwrap_or_default()).await
}

async fn exchange(
    state: &AppState,
    params: CallbackParams,
) -> Result<Json<TokenResponse>, ApiError> {
    let code = params.code.unwrap_or_default();
    let oauth_state = params.state.unwrap_or_default();
    let tokens = oauth_flow(state)?.callback(&code, &oauth_state).await?;
    Ok(Json(tokens))
}

pub async fn oauth_refresh(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let tokens = oauth_flow(&state)?.refresh().await?;
    Ok(Json(serde_json::json!({ "access_token": tokens.access_token })))
}

/// Forward a fixed test prompt to OpenAI and return the raw provider JSON.
pub async fn diag_openai(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let chat = state.diag_openai.as_ref().ok_or_else(|| {
        ApiError::not_found("provider not configured", "no openai provider in config")
    })?;
    Ok(Json(chat.raw(&CompletionRequest::new(DIAG_PROMPT)).await?))
}

/// Forward a fixed test prompt to Grok and return the raw provider JSON.
pub async fn diag_grok(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let chat = state.diag_grok.as_ref().ok_or_else(|| {
        ApiError::not_found("provider not configured", "no grok provider in config")
    })?;
    Ok(Json(chat.raw(&CompletionRequest::new(DIAG_PROMPT)).await?))
}
