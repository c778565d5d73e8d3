use std::sync::Arc;

use super::credentials::CredentialStore;
use super::types::{
    CredentialPair, IdentitySummary, SessionState, ACCESS_TOKEN_KEY, AUTH_USER_KEY,
    REFRESH_TOKEN_KEY,
};
use crate::error::StoreError;

/// Session manager
/// Owns the credential store and is the only code that reads or writes session keys
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Restore the persisted session at startup
    pub fn init(&self) -> Result<SessionState, StoreError> {
        let access_token = self.access_token()?;
        let refresh_token = self.refresh_token()?;
        let user = self.identity()?;

        tracing::debug!(
            has_access_token = access_token.is_some(),
            has_refresh_token = refresh_token.is_some(),
            user = user.as_ref().map(|u| u.username.as_str()),
            "Session restored from storage"
        );

        Ok(SessionState {
            access_token,
            refresh_token,
            user,
        })
    }

    pub fn access_token(&self) -> Result<Option<String>, StoreError> {
        self.store.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        self.store.get(REFRESH_TOKEN_KEY)
    }

    /// Cached identity; an unreadable entry counts as absent
    pub fn identity(&self) -> Result<Option<IdentitySummary>, StoreError> {
        let Some(raw) = self.store.get(AUTH_USER_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(identity) => Ok(Some(identity)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable cached identity: {}", e);
                Ok(None)
            }
        }
    }

    pub fn is_authenticated(&self) -> Result<bool, StoreError> {
        Ok(self.access_token()?.is_some())
    }

    pub fn store_credentials(&self, credentials: &CredentialPair) -> Result<(), StoreError> {
        self.store.set(ACCESS_TOKEN_KEY, &credentials.access_token)?;
        self.store.set(REFRESH_TOKEN_KEY, &credentials.refresh_token)
    }

    /// Replace the access token after a refresh; the refresh token is kept
    pub fn update_access_token(&self, access_token: &str) -> Result<(), StoreError> {
        self.store.set(ACCESS_TOKEN_KEY, access_token)
    }

    pub fn store_identity(&self, identity: &IdentitySummary) -> Result<(), StoreError> {
        let raw = serde_json::to_string(identity)?;
        self.store.set(AUTH_USER_KEY, &raw)
    }

    /// Drop both tokens after an unrecoverable refresh failure
    pub fn clear_tokens(&self) -> Result<(), StoreError> {
        self.store.remove(ACCESS_TOKEN_KEY)?;
        self.store.remove(REFRESH_TOKEN_KEY)
    }

    /// Log out: drop tokens and the cached identity
    pub fn teardown(&self) -> Result<(), StoreError> {
        self.clear_tokens()?;
        self.store.remove(AUTH_USER_KEY)?;
        tracing::info!("Session cleared");
        Ok(())
    }
}
