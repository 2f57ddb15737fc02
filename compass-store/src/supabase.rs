//! Supabase (PostgREST) row-store backend.
//!
//! State records live one-per-row keyed by `state`; the token record is a
//! singleton row with a fixed id, upserted on every refresh. The atomic
//! take is a `DELETE ... Prefer: return=representation`, which hands back
//! the deleted row in the same round trip.

use std::borrow::Cow;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use compass_http::{Auth, HttpClient, RequestOpts};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::{SessionStore, StateRecord, StoreError, TokenRecord};

/// Fixed primary key of the singleton token row.
const TOKEN_ROW_ID: i64 = 1;

pub struct SupabaseStore {
    http: HttpClient,
    service_key: String,
    state_table: String,
    token_table: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenRow {
    id: i64,
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_at: DateTime<Utc>,
}

impl SupabaseStore {
    pub fn new(
        url: &str,
        service_key: String,
        state_table: String,
        token_table: String,
    ) -> Result<Self, StoreError> {
        let base = format!("{}/rest/v1/", url.trim_end_matches('/'));
        Ok(Self {
            http: HttpClient::new(&base)?,
            service_key,
            state_table,
            token_table,
        })
    }

    fn headers(&self, prefer: &str) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("apikey"),
            HeaderValue::from_str(&self.service_key)
                .map_err(|e| StoreError::Backend(format!("bad service key: {e}")))?,
        );
        headers.insert(
            HeaderName::from_static("prefer"),
            HeaderValue::from_str(prefer)
                .map_err(|e| StoreError::Backend(format!("bad prefer header: {e}")))?,
        );
        Ok(headers)
    }
}

#[async_trait]
impl SessionStore for SupabaseStore {
    async fn put_state(&self, record: StateRecord) -> Result<(), StoreError> {
        let _rows: Vec<StateRecord> = self
            .http
            .post_json(
                &self.state_table,
                &[&record],
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.service_key)),
                    headers: Some(
                        self.headers("resolution=merge-duplicates,return=representation")?,
                    ),
                    query: Some(vec![("on_conflict", Cow::Borrowed("state"))]),
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }

    async fn take_state(&self, state: &str) -> Result<Option<StateRecord>, StoreError> {
        let filter = format!("eq.{state}");
        let deleted: Vec<StateRecord> = self
            .http
            .delete_json(
                &self.state_table,
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.service_key)),
                    headers: Some(self.headers("return=representation")?),
                    query: Some(vec![("state", Cow::Owned(filter))]),
                    ..Default::default()
                },
            )
            .await?;

        match deleted.into_iter().next() {
            Some(r) if r.is_expired() => {
                tracing::debug!(state = %state, "store.state_expired");
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn put_tokens(&self, record: TokenRecord) -> Result<(), StoreError> {
        let row = TokenRow {
            id: TOKEN_ROW_ID,
            access_token: record.access_token,
            refresh_token: record.refresh_token,
            expires_at: record.expires_at,
        };
        let _rows: Vec<TokenRow> = self
            .http
            .post_json(
                &self.token_table,
                &[&row],
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.service_key)),
                    headers: Some(
                        self.headers("resolution=merge-duplicates,return=representation")?,
                    ),
                    query: Some(vec![("on_conflict", Cow::Borrowed("id"))]),
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }

    async fn get_tokens(&self) -> Result<Option<TokenRecord>, StoreError> {
        let rows: Vec<TokenRow> = self
            .http
            .get_json(
                &self.token_table,
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.service_key)),
                    headers: Some(self.headers("return=representation")?),
                    query: Some(vec![(
                        "id",
                        Cow::Owned(format!("eq.{TOKEN_ROW_ID}")),
                    )]),
                    ..Default::default()
                },
            )
            .await?;

        Ok(rows.into_iter().next().map(|row| TokenRecord {
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            expires_at: row.expires_at,
        }))
    }

    async fn clear_tokens(&self) -> Result<(), StoreError> {
        let _rows: Vec<TokenRow> = self
            .http
            .delete_json(
                &self.token_table,
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.service_key)),
                    headers: Some(self.headers("return=representation")?),
                    query: Some(vec![(
                        "id",
                        Cow::Owned(format!("eq.{TOKEN_ROW_ID}")),
                    )]),
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }
}
