use serde::{Deserialize, Serialize};
use validator::Validate;

/// User summary persisted alongside the token (`user` key)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Backend user id
    pub id: i64,

    /// Login name
    pub username: String,

    /// Role assigned by the backend (e.g. "user", "admin")
    #[serde(default)]
    pub role: Option<String>,
}

/// An authenticated session: the user summary plus the bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: UserSummary,
    pub token: String,
}

/// Credentials for `POST /auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Payload for `POST /auth/register`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired login name
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    /// Contact email
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,

    /// Plain-text password, only ever sent over the wire
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Body returned by the login and register endpoints.
///
/// Register only carries `success` and `message`; login carries the token and the
/// user summary fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: Option<bool>,

    #[serde(default)]
    pub message: Option<String>,

    /// Bearer token issued on login
    #[serde(default)]
    pub access_token: Option<String>,

    /// Alternative token field some register responses use
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub user_id: Option<i64>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub role: Option<String>,
}

impl AuthResponse {
    /// The bearer token, whichever field carried it
    pub fn bearer_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .or(self.token.as_deref())
            .filter(|token| !token.is_empty())
    }

    /// Build a session from the response.
    ///
    /// `fallback_username` is used when the response omits the username. Returns `None`
    /// when there is no token or no user id.
    pub fn into_session(self, fallback_username: &str) -> Option<Session> {
        let token = self.bearer_token()?.to_string();
        let id = self.user_id?;
        let username = self
            .username
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| fallback_username.to_string());

        Some(Session {
            user: UserSummary {
                id,
                username,
                role: self.role,
            },
            token,
        })
    }
}

/// Body of `GET /auth/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_into_session() {
        let response: AuthResponse = serde_json::from_str(
            r#"{"success": true, "access_token": "abc", "user_id": 7, "username": "ada", "role": "user"}"#,
        )
        .unwrap();

        let session = response.into_session("ignored").unwrap();
        assert_eq!(session.token, "abc");
        assert_eq!(session.user.id, 7);
        assert_eq!(session.user.username, "ada");
        assert_eq!(session.user.role.as_deref(), Some("user"));
    }

    #[test]
    fn test_register_response_has_no_session() {
        let response: AuthResponse =
            serde_json::from_str(r#"{"success": true, "message": "User registered successfully"}"#).unwrap();

        assert!(response.bearer_token().is_none());
        assert!(response.into_session("ada").is_none());
    }

    #[test]
    fn test_session_uses_fallback_username() {
        let response = AuthResponse {
            token: Some("t".to_string()),
            user_id: Some(3),
            ..Default::default()
        };

        let session = response.into_session("grace").unwrap();
        assert_eq!(session.user.username, "grace");
        assert!(session.user.role.is_none());
    }

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "secret1".to_string(),
        };
        assert!(valid.validate().is_ok());

        let short_password = RegisterRequest {
            password: "123".to_string(),
            ..valid.clone()
        };
        let errors = short_password.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            ..valid
        };
        let errors = bad_email.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }
}
