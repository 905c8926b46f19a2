use serde::{Deserialize, Serialize};

/// User summary as persisted under the `user` key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    /// Backend user id
    pub id: i64,

    /// Login name
    pub username: String,

    /// Role assigned by the backend
    #[serde(default)]
    pub role: Option<String>,
}

/// Everything persisted for a signed-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    /// Bearer token, persisted under the `token` key
    pub token: String,

    pub user: StoredUser,
}
