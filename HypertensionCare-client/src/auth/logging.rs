use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Types of authentication events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthEventType {
    /// Credentials submitted and accepted
    Login,
    /// Session cleared
    Logout,
    /// Account created
    Registration,
    /// Credentials rejected or login unusable
    FailedLogin,
    /// Registration rejected
    FailedRegistration,
    /// Persisted session picked up at start-up
    SessionRestored,
}

impl std::fmt::Display for AuthEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthEventType::Login => write!(f, "LOGIN"),
            AuthEventType::Logout => write!(f, "LOGOUT"),
            AuthEventType::Registration => write!(f, "REGISTRATION"),
            AuthEventType::FailedLogin => write!(f, "FAILED_LOGIN"),
            AuthEventType::FailedRegistration => write!(f, "FAILED_REGISTRATION"),
            AuthEventType::SessionRestored => write!(f, "SESSION_RESTORED"),
        }
    }
}

/// Authentication event record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEvent {
    pub event_type: AuthEventType,
    /// Username the event concerns, if known
    pub username: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub details: Option<String>,
    /// Endpoint the event came from
    pub endpoint: Option<String>,
}

impl AuthEvent {
    pub fn new(event_type: AuthEventType, username: Option<&str>, success: bool) -> Self {
        Self {
            event_type,
            username: username.map(String::from),
            timestamp: Utc::now(),
            success,
            details: None,
            endpoint: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// One-line rendering used by the log
    pub fn log_line(&self) -> String {
        let username = self.username.as_deref().unwrap_or("anonymous");
        let status = if self.success { "SUCCESS" } else { "FAILURE" };
        let details = self.details.as_deref().unwrap_or("");

        format!(
            "AUTH-LOG [{}] [{}] [{}] [{}] {}",
            self.event_type,
            username,
            status,
            self.timestamp.to_rfc3339(),
            details
        )
    }
}

/// Log an authentication event
pub fn log_auth_event(event: AuthEvent) {
    match &event.endpoint {
        Some(endpoint) => info!(endpoint = %endpoint, "{}", event.log_line()),
        None => info!("{}", event.log_line()),
    }
}

pub fn log_successful_login(username: &str) {
    let event = AuthEvent::new(AuthEventType::Login, Some(username), true).with_endpoint("auth/login");
    log_auth_event(event);
}

pub fn log_failed_login(username: &str, reason: &str) {
    let event = AuthEvent::new(AuthEventType::FailedLogin, Some(username), false)
        .with_details(reason)
        .with_endpoint("auth/login");
    log_auth_event(event);
}

pub fn log_registration(username: &str, success: bool, details: Option<&str>) {
    let event_type = if success {
        AuthEventType::Registration
    } else {
        AuthEventType::FailedRegistration
    };

    let mut event = AuthEvent::new(event_type, Some(username), success).with_endpoint("auth/register");
    if let Some(d) = details {
        event = event.with_details(d);
    }
    log_auth_event(event);
}

pub fn log_logout(username: Option<&str>) {
    log_auth_event(AuthEvent::new(AuthEventType::Logout, username, true));
}

pub fn log_session_restored(username: &str) {
    log_auth_event(AuthEvent::new(AuthEventType::SessionRestored, Some(username), true));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_auth_event() {
        let event = AuthEvent::new(AuthEventType::FailedLogin, Some("ada"), false)
            .with_details("Invalid credentials")
            .with_endpoint("auth/login");

        assert_eq!(event.event_type, AuthEventType::FailedLogin);
        assert_eq!(event.username, Some("ada".to_string()));
        assert!(!event.success);
        assert_eq!(event.endpoint.as_deref(), Some("auth/login"));
    }

    #[test]
    fn test_log_line_format() {
        let event = AuthEvent::new(AuthEventType::Logout, None, true);
        let line = event.log_line();
        assert!(line.starts_with("AUTH-LOG [LOGOUT] [anonymous] [SUCCESS] ["));
    }

    #[test]
    fn test_event_type_display() {
        assert_eq!(AuthEventType::Login.to_string(), "LOGIN");
        assert_eq!(AuthEventType::Registration.to_string(), "REGISTRATION");
        assert_eq!(AuthEventType::FailedRegistration.to_string(), "FAILED_REGISTRATION");
    }
}
