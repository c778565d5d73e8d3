// Authentication types

use serde::{Deserialize, Serialize};

/// Storage key for the short-lived access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage key for the long-lived refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Storage key for the serialized identity summary
pub const AUTH_USER_KEY: &str = "authUser";

/// Access/refresh token pair issued on login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Identity cached after login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub club: Option<i64>,
}

impl IdentitySummary {
    /// Identity with only the username known
    pub fn username_only(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            club: None,
        }
    }
}

/// Session state restored from storage at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<IdentitySummary>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// Login request body
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Login response body
#[derive(Deserialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

/// Refresh request body
#[derive(Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Refresh response body (the refresh token is not rotated)
#[derive(Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}
