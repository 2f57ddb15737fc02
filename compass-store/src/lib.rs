//! Session persistence for the OAuth flow.
//!
//! Handlers never touch a concrete backend: they hold an
//! `Arc<dyn SessionStore>` and tests substitute [`MemoryStore`]. The two
//! record kinds are deliberately narrow: a single-use PKCE state record
//! with a 10-minute TTL, and the one live token record per installation.

pub mod memory;
pub mod supabase;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateRecord {
    pub state: String,
    pub code_verifier: String,
    pub expires_at: DateTime<Utc>,
}

impl StateRecord {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenRecord {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<compass_http::HttpError> for StoreError {
    fn from(e: compass_http::HttpError) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// Key-value persistence over OAuth state and token records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put_state(&self, record: StateRecord) -> Result<(), StoreError>;

    /// Remove and return the record for `state`, atomically with the
    /// lookup, so a callback can never be replayed within the TTL window.
    /// Expired records are treated as absent.
    async fn take_state(&self, state: &str) -> Result<Option<StateRecord>, StoreError>;

    /// Upsert the installation's token record.
    async fn put_tokens(&self, record: TokenRecord) -> Result<(), StoreError>;

    async fn get_tokens(&self) -> Result<Option<TokenRecord>, StoreError>;

    async fn clear_tokens(&self) -> Result<(), StoreError>;
}
