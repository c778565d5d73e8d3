// Error handling module
// Defines the error types surfaced by the API client and its collaborators

use serde_json::Value;
use thiserror::Error;

/// Credential storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite backend failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to create the database directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A previous holder of the connection panicked
    #[error("Credential store lock poisoned")]
    Poisoned,

    /// A structured value could not be encoded for storage
    #[error("Failed to encode stored value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure of the token refresh call
///
/// `Clone` so that every caller waiting on a shared refresh receives the same error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RefreshError {
    /// No refresh token in storage
    #[error("No refresh token available")]
    MissingRefreshToken,

    /// Refresh endpoint unreachable
    #[error("Refresh request failed: {0}")]
    Transport(String),

    /// Refresh endpoint answered with a non-2xx status
    #[error("Refresh rejected: {status} - {body}")]
    Rejected { status: u16, body: String },

    /// Refresh endpoint answered 2xx without a usable access token
    #[error("Invalid refresh response: {0}")]
    InvalidResponse(String),

    /// Reading or writing the credential store failed
    #[error("Credential store error: {0}")]
    Store(String),
}

impl From<StoreError> for RefreshError {
    fn from(err: StoreError) -> Self {
        RefreshError::Store(err.to_string())
    }
}

/// Coarse error categories callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response was received
    Transport,
    /// The API answered with a non-2xx status
    Client,
    /// Token refresh failed and the session was torn down
    SessionExpired,
    /// Local failure (storage, path building, decoding)
    Internal,
}

/// Errors returned by the API client
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport failure, no response received
    #[error("HTTP request failed ({kind}): {source}")]
    Transport {
        kind: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response from the API
    #[error("API error: {status} - {body}")]
    Status { status: u16, body: String },

    /// Unrecoverable authentication failure
    #[error("Session expired: {0}")]
    SessionExpired(#[from] RefreshError),

    /// Request path could not be joined to the base URL
    #[error("Invalid request path: {0}")]
    InvalidPath(String),

    /// Request body could not be serialized
    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[source] reqwest::Error),

    /// Credential storage failure
    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Build a transport error, classifying the underlying reqwest failure
    pub fn transport(source: reqwest::Error) -> Self {
        ApiError::Transport {
            kind: classify_transport_error(&source),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Transport { .. } => ErrorKind::Transport,
            ApiError::Status { .. } => ErrorKind::Client,
            ApiError::SessionExpired(_) => ErrorKind::SessionExpired,
            ApiError::InvalidPath(_)
            | ApiError::Encode(_)
            | ApiError::Decode(_)
            | ApiError::Store(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status of the failed response, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Structured error payload returned by the API (validation errors etc.)
    pub fn body_json(&self) -> Option<Value> {
        match self {
            ApiError::Status { body, .. } => serde_json::from_str(body).ok(),
            _ => None,
        }
    }
}

/// Categorize a reqwest error for logging
pub fn classify_transport_error(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_builder() {
        "invalid_request"
    } else if e.is_connect() {
        "connection_failed"
    } else if e.is_request() {
        "request_error"
    } else if e.is_body() {
        "body_error"
    } else if e.is_decode() {
        "decode_error"
    } else {
        "unknown"
    }
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
