// Login, registration and the cached identity

use serde_json::Value;

use super::paths;
use crate::auth::{CredentialPair, IdentitySummary, LoginRequest, TokenPairResponse};
use crate::error::Result;
use crate::http_client::ApiClient;
use crate::models::{NewAccount, UserRecord};

/// Outcome of matching the logged-in username against `users/`
///
/// Every branch carries a usable identity; the degraded branches fall back to
/// the username alone.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityLookup {
    /// Found in the user listing
    Resolved(IdentitySummary),
    /// Listing succeeded but did not contain the username
    NotListed(IdentitySummary),
    /// Listing failed
    Unavailable {
        identity: IdentitySummary,
        reason: String,
    },
}

impl IdentityLookup {
    pub fn identity(&self) -> &IdentitySummary {
        match self {
            IdentityLookup::Resolved(identity)
            | IdentityLookup::NotListed(identity)
            | IdentityLookup::Unavailable { identity, .. } => identity,
        }
    }

    /// True when only the username is known
    pub fn is_degraded(&self) -> bool {
        !matches!(self, IdentityLookup::Resolved(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub identity: IdentityLookup,
}

impl ApiClient {
    /// Exchange a username and password for tokens and cache the identity
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        let tokens: TokenPairResponse = self
            .post_json(paths::LOGIN, &LoginRequest { username, password })
            .await?;

        self.session().store_credentials(&CredentialPair {
            access_token: tokens.access,
            refresh_token: tokens.refresh,
        })?;
        tracing::info!(username = username, "Logged in");

        let identity = self.lookup_identity(username).await;
        if let IdentityLookup::Resolved(ref summary) = identity {
            self.session().store_identity(summary)?;
        }

        Ok(LoginOutcome { identity })
    }

    /// Find `username` in the user listing, falling back to the bare username
    pub async fn lookup_identity(&self, username: &str) -> IdentityLookup {
        match self.get_json::<Vec<UserRecord>>(paths::USERS).await {
            Ok(users) => match users.into_iter().find(|u| u.username == username) {
                Some(user) => IdentityLookup::Resolved(IdentitySummary {
                    username: user.username,
                    club: user.club,
                }),
                None => {
                    tracing::debug!(username = username, "User not present in listing");
                    IdentityLookup::NotListed(IdentitySummary::username_only(username))
                }
            },
            Err(e) => {
                tracing::warn!(username = username, "Identity lookup failed: {}", e);
                IdentityLookup::Unavailable {
                    identity: IdentitySummary::username_only(username),
                    reason: e.to_string(),
                }
            }
        }
    }

    pub async fn register(&self, account: &NewAccount) -> Result<Value> {
        let created = self.post_json(paths::REGISTER, account).await?;
        tracing::info!(username = %account.username, "Account registered");
        Ok(created)
    }

    /// Drop the stored session. Succeeds when no session exists.
    pub fn logout(&self) -> Result<()> {
        self.session().teardown()?;
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>> {
        self.get_json(paths::USERS).await
    }
}
