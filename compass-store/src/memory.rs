//! In-process store used when no external backend is configured.
//!
//! Best-effort by design: everything resets on process restart, which is
//! acceptable because the OAuth provider re-issues state on the next login.

use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::{SessionStore, StateRecord, StoreError, TokenRecord};

#[derive(Default)]
pub struct MemoryStore {
    states: DashMap<String, StateRecord>,
    tokens: Mutex<Option<TokenRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn put_state(&self, record: StateRecord) -> Result<(), StoreError> {
        self.states.insert(record.state.clone(), record);
        Ok(())
    }

    async fn take_state(&self, state: &str) -> Result<Option<StateRecord>, StoreError> {
        // DashMap::remove is the atomic take; the record is gone for any
        // concurrent caller even if it turns out to be expired.
        let record = self.states.remove(state).map(|(_, r)| r);
        match record {
            Some(r) if r.is_expired() => {
                tracing::debug!(state = %state, "store.state_expired");
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn put_tokens(&self, record: TokenRecord) -> Result<(), StoreError> {
        *self
            .tokens
            .lock()
            .map_err(|_| StoreError::Backend("token lock poisoned".into()))? = Some(record);
        Ok(())
    }

    async fn get_tokens(&self) -> Result<Option<TokenRecord>, StoreError> {
        Ok(self
            .tokens
            .lock()
            .map_err(|_| StoreError::Backend("token lock poisoned".into()))?
            .clone())
    }

    async fn clear_tokens(&self) -> Result<(), StoreError> {
        *self
            .tokens
            .lock()
            .map_err(|_| StoreError::Backend("token lock poisoned".into()))? = None;
        Ok(())
    }
}
