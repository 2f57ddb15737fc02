//! Loader for workspace configuration with YAML + environment overlays.
//!
//! The expected file is `compass.yaml`; `COMPASS__`-prefixed environment
//! variables override individual keys, and `${VAR}` placeholders inside
//! string values are expanded (recursively, with a depth cap) before the
//! strongly typed structs are materialised.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct CompassConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub social: SocialConfig,
    #[serde(default)]
    pub oauth: Option<OAuthSettings>,
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Origins allowed to receive their own value back in
    /// `Access-Control-Allow-Origin`. Anything else gets `default_origin`.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_origin")]
    pub default_origin: String,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            allowed_origins: Vec::new(),
            default_origin: default_origin(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_limit")]
    pub limit: u32,
    #[serde(default = "default_rate_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: default_rate_limit(),
            window_secs: default_rate_window_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SocialConfig {
    /// App-only bearer token used when the caller supplies a user id
    /// rather than an access token.
    pub bearer_token: String,
}

#[derive(Debug, Deserialize)]
pub struct OAuthSettings {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    /// Provider used for classification and based-score judgments.
    pub classifier: LlmProviderConfig,
    /// Search-augmented provider for fact-checking. Absent disables the
    /// assertion/fact-check extension entirely.
    #[serde(default)]
    pub fact_check: Option<LlmProviderConfig>,
    /// Gateway retry attempts (call sites historically used 3–5).
    #[serde(default)]
    pub attempts: Option<usize>,
}

/// The tag is `provider`; each variant carries its endpoint default.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LlmProviderConfig {
    Openai {
        model: String,
        api_key: String,
        #[serde(default = "default_openai_endpoint")]
        endpoint: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
    },
    Grok {
        model: String,
        api_key: String,
        #[serde(default = "default_grok_endpoint")]
        endpoint: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
    },
    Perplexity {
        model: String,
        api_key: String,
        #[serde(default = "default_perplexity_endpoint")]
        endpoint: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
    },
}

#[derive(Debug, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Process-local maps; best-effort, reset on restart.
    #[default]
    Memory,
    Supabase {
        url: String,
        service_key: String,
        #[serde(default = "default_state_table")]
        state_table: String,
        #[serde(default = "default_token_table")]
        token_table: String,
    },
}

fn default_bind() -> String {
    "127.0.0.1:8080".into()
}
fn default_origin() -> String {
    "http://localhost:3000".into()
}
fn default_rate_limit() -> u32 {
    300
}
fn default_rate_window_secs() -> u64 {
    900
}
fn default_auth_url() -> String {
    "https://twitter.com/i/oauth2/authorize".into()
}
fn default_token_url() -> String {
    "https://api.twitter.com/2/oauth2/token".into()
}
fn default_scopes() -> Vec<String> {
    vec![
        "tweet.read".into(),
        "users.read".into(),
        "offline.access".into(),
    ]
}
fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".into()
}
fn default_grok_endpoint() -> String {
    "https://api.x.ai/v1".into()
}
fn default_perplexity_endpoint() -> String {
    "https://api.perplexity.ai".into()
}
fn default_state_table() -> String {
    "oauth_state".into()
}
fn default_token_table() -> String {
    "oauth_tokens".into()
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct CompassConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for CompassConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CompassConfigLoader {
    /// Start with sensible defaults: YAML file + `COMPASS__` env overrides.
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(Environment::with_prefix("COMPASS").separator("__"));
        Self { builder }
    }

    /// Attach a config file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use compass_config::CompassConfigLoader;
    ///
    /// let cfg = CompassConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// social:
    ///   bearer_token: "app-bearer"
    /// analysis:
    ///   classifier:
    ///     provider: "openai"
    ///     model: "gpt-4o-mini"
    ///     api_key: "sk-test"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.server.bind, "127.0.0.1:8080");
    /// assert_eq!(cfg.server.rate_limit.limit, 300);
    /// assert!(cfg.oauth.is_none());
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    pub fn load(self) -> Result<CompassConfig, ConfigError> {
        let cfg = self.builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MINIMAL: &str = r#"
social:
  bearer_token: "${X_BEARER}"
analysis:
  classifier:
    provider: "grok"
    model: "grok-2"
    api_key: "xai-key"
  fact_check:
    provider: "perplexity"
    model: "sonar"
    api_key: "pplx-key"
store:
  kind: "supabase"
  url: "https://proj.supabase.co"
  service_key: "service-role"
"#;

    #[test]
    fn expands_env_into_typed_config() {
        temp_env::with_var("X_BEARER", Some("bearer-from-env"), || {
            let cfg = CompassConfigLoader::new()
                .with_yaml_str(MINIMAL)
                .load()
                .expect("valid config");

            assert_eq!(cfg.social.bearer_token, "bearer-from-env");
            match &cfg.analysis.classifier {
                LlmProviderConfig::Grok { model, endpoint, .. } => {
                    assert_eq!(model, "grok-2");
                    assert_eq!(endpoint, "https://api.x.ai/v1");
                }
                other => panic!("expected grok classifier, got {other:?}"),
            }
            match &cfg.store {
                StoreConfig::Supabase { state_table, token_table, .. } => {
                    assert_eq!(state_table, "oauth_state");
                    assert_eq!(token_table, "oauth_tokens");
                }
                StoreConfig::Memory => panic!("expected supabase store"),
            }
        });
    }

    #[test]
    fn fact_check_provider_is_optional() {
        let cfg = CompassConfigLoader::new()
            .with_yaml_str(
                r#"
social:
  bearer_token: "tok"
analysis:
  classifier:
    provider: "openai"
    model: "gpt-4o-mini"
    api_key: "sk"
"#,
            )
            .load()
            .unwrap();
        assert!(cfg.analysis.fact_check.is_none());
        assert!(matches!(cfg.store, StoreConfig::Memory));
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("INNER", Some("dashboards")),
                ("OUTER", Some("https://${INNER}.example.com")),
            ],
            || {
                let mut v = json!("origin=${OUTER}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("origin=https://dashboards.example.com"));
            },
        );
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST}"));
    }

    #[test]
    fn stops_on_cyclic_env_references() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }
}
