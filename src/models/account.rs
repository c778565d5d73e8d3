use serde::{Deserialize, Serialize};

/// Entry of the `users/` listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(default)]
    pub club: Option<i64>,
}

/// Registration payload
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub club: Option<i64>,
}
