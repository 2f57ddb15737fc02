//! Application wiring: config → state → router.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use compass_analysis::Analyzer;
use compass_config::{CompassConfig, LlmProviderConfig, StoreConfig};
use compass_llm::chat::ChatCompletions;
use compass_llm::{client_from_config, raw_client_from_config, sampling_defaults};
use compass_oauth::{OAuthConfig, PkceFlow};
use compass_store::{MemoryStore, SessionStore, SupabaseStore};
use tower_http::trace::TraceLayer;

use crate::cors::{CorsSettings, apply_cors};
use crate::rate::FixedWindow;
use crate::routes;

const X_API_BASE: &str = "https://api.twitter.com";
const DEFAULT_GATEWAY_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub social_bearer: String,
    /// Overridable so tests can point the social client at a mock server.
    pub social_base: String,
    pub oauth: Option<Arc<PkceFlow>>,
    pub limiter: Arc<FixedWindow>,
    pub diag_openai: Option<Arc<ChatCompletions>>,
    pub diag_grok: Option<Arc<ChatCompletions>>,
}

/// Build the shared state and CORS settings from loaded configuration.
pub fn state_from_config(config: &CompassConfig) -> anyhow::Result<(AppState, CorsSettings)> {
    let attempts = config
        .analysis
        .attempts
        .unwrap_or(DEFAULT_GATEWAY_ATTEMPTS);

    let classifier = client_from_config(&config.analysis.classifier, attempts)?;
    let (temperature, max_tokens) = sampling_defaults(&config.analysis.classifier);
    let mut analyzer = Analyzer::new(classifier).with_sampling(temperature, max_tokens);
    if let Some(fact_check) = &config.analysis.fact_check {
        analyzer = analyzer.with_fact_checker(client_from_config(fact_check, attempts)?);
    }

    let store: Arc<dyn SessionStore> = match &config.store {
        StoreConfig::Memory => Arc::new(MemoryStore::new()),
        StoreConfig::Supabase {
            url,
            service_key,
            state_table,
            token_table,
        } => Arc::new(SupabaseStore::new(
            url,
            service_key.clone(),
            state_table.clone(),
            token_table.clone(),
        )?),
    };

    let oauth = match &config.oauth {
        Some(settings) => Some(Arc::new(PkceFlow::new(
            OAuthConfig {
                client_id: settings.client_id.clone(),
                client_secret: settings.client_secret.clone(),
                redirect_uri: settings.redirect_uri.clone(),
                auth_url: settings.auth_url.clone(),
                token_url: settings.token_url.clone(),
                scopes: settings.scopes.clone(),
            },
            store.clone(),
        )?)),
        None => None,
    };

    let mut diag_openai = None;
    let mut diag_grok = None;
    let providers = [
        Some(&config.analysis.classifier),
        config.analysis.fact_check.as_ref(),
    ];
    for provider in providers.into_iter().flatten() {
        match provider {
            LlmProviderConfig::Openai { .. } if diag_openai.is_none() => {
                diag_openai = Some(Arc::new(raw_client_from_config(provider)?));
            }
            LlmProviderConfig::Grok { .. } if diag_grok.is_none() => {
                diag_grok = Some(Arc::new(raw_client_from_config(provider)?));
            }
            _ => {}
        }
    }

    let limiter = Arc::new(FixedWindow::new(
        config.server.rate_limit.limit,
        Duration::from_secs(config.server.rate_limit.window_secs),
    ));

    let state = AppState {
        analyzer: Arc::new(analyzer),
        social_bearer: config.social.bearer_token.clone(),
        social_base: X_API_BASE.to_string(),
        oauth,
        limiter,
        diag_openai,
        diag_grok,
    };
    let cors = CorsSettings {
        allowed_origins: config.server.allowed_origins.clone(),
        default_origin: config.server.default_origin.clone(),
    };
    Ok((state, cors))
}

pub fn build_router(state: AppState, cors: CorsSettings) -> Router {
    Router::new()
        .route("/process", post(routes::process))
        .route("/oauth/request_token", get(routes::oauth_request_token))
        .route("/oauth/init", post(routes::oauth_init))
        .route(
            "/oauth/callback",
            get(routes::oauth_callback_get).post(routes::oauth_callback_post),
        )
        .route("/oauth/refresh", post(routes::oauth_refresh))
        .route("/openai", post(routes::diag_openai))
        .route("/grok", post(routes::diag_grok))
        .layer(middleware::from_fn_with_state(cors, apply_cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
