// Authentication module
// Manages the token lifecycle: storage, restoration and renewal

mod credentials;
mod manager;
mod refresh;
mod types;

pub use credentials::{CredentialStore, MemoryStore, SqliteStore};
pub use manager::SessionManager;
pub use refresh::{refresh_access_token, TokenRefresher};
pub use types::{
    CredentialPair, IdentitySummary, LoginRequest, SessionState, TokenPairResponse,
    ACCESS_TOKEN_KEY, AUTH_USER_KEY, REFRESH_TOKEN_KEY,
};
