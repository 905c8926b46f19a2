use hypertension_care_data::repository::StorageError;
use hypertension_care_domain::services::IntakeError;
use serde_json::Value;
use thiserror::Error;

/// Notice shown for network failures and server errors
pub const GENERIC_ERROR_MESSAGE: &str = "Request failed, please try again.";

/// Errors surfaced by the HTTP client, the services and the page controllers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input rejected locally, nothing was sent
    #[error("{0}")]
    Validation(#[from] IntakeError),

    /// The backend answered with a non-success status
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Http {
        status: u16,
        message: Option<String>,
        missing_fields: Vec<String>,
    },

    /// The request never got an answer
    #[error("Network error: {0}")]
    Network(String),

    /// The owning view went away before the response arrived
    #[error("Request cancelled")]
    Cancelled,

    /// The backend answered but the response was unusable
    #[error("{0}")]
    Rejected(String),

    #[error("Could not decode response: {0}")]
    Decode(String),

    #[error("Invalid endpoint: {0}")]
    Url(#[from] url::ParseError),

    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Build an HTTP error from a status and the raw response body.
    ///
    /// Bodies of the form `{message}`, `{error}` and `{missing_fields: [..]}` are
    /// recognised; anything else leaves the message empty.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();

        let message = parsed.as_ref().and_then(|json| {
            ["message", "error"]
                .iter()
                .find_map(|key| json.get(key).and_then(Value::as_str))
                .filter(|msg| !msg.trim().is_empty())
                .map(str::to_string)
        });

        let missing_fields = parsed
            .as_ref()
            .and_then(|json| json.get("missing_fields"))
            .and_then(Value::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        ApiError::Http {
            status,
            message,
            missing_fields,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }

    /// Fields the backend reported missing, if this is a `missing_fields` response
    pub fn missing_fields(&self) -> Option<&[String]> {
        match self {
            ApiError::Http { missing_fields, .. } if !missing_fields.is_empty() => Some(missing_fields),
            _ => None,
        }
    }

    /// Message that may be shown verbatim: local validation failures and 4xx bodies
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Validation(_) => None,
            ApiError::Http {
                status, message, ..
            } if *status < 500 => message.as_deref(),
            ApiError::Rejected(message) => Some(message),
            _ => None,
        }
    }

    /// Text to show the user
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(e) => e.to_string(),
            ApiError::Cancelled => self.to_string(),
            _ => self
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
        }
    }

    /// User text with a caller-specific fallback in place of the generic notice
    pub fn user_message_or(&self, fallback: &str) -> String {
        match self {
            ApiError::Validation(e) => e.to_string(),
            ApiError::Cancelled => self.to_string(),
            _ => self
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string()),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_body() {
        let err = ApiError::from_response(401, r#"{"success": false, "message": "Invalid credentials"}"#);
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.user_message(), "Invalid credentials");
        assert_eq!(err.to_string(), "HTTP 401: Invalid credentials");
    }

    #[test]
    fn test_error_body() {
        let err = ApiError::from_response(400, r#"{"success": false, "error": "Age must be positive"}"#);
        assert_eq!(err.server_message(), Some("Age must be positive"));
    }

    #[test]
    fn test_missing_fields_body() {
        let err = ApiError::from_response(
            400,
            r#"{"message": "Profile incomplete", "missing_fields": ["age", "gender"]}"#,
        );
        assert_eq!(
            err.missing_fields(),
            Some(&["age".to_string(), "gender".to_string()][..])
        );
    }

    #[test]
    fn test_server_errors_use_generic_notice() {
        let err = ApiError::from_response(500, r#"{"message": "Traceback (most recent call last)"}"#);
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);

        let err = ApiError::Network("connection refused".to_string());
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
        assert_eq!(err.user_message_or("Login failed"), "Login failed");
    }

    #[test]
    fn test_cancelled_reads_the_same_with_or_without_fallback() {
        let err = ApiError::Cancelled;
        assert_eq!(err.user_message(), "Request cancelled");
        assert_eq!(err.user_message_or("Login failed"), "Request cancelled");
    }

    #[test]
    fn test_unparseable_body() {
        let err = ApiError::from_response(404, "<html>Not Found</html>");
        assert!(err.is_not_found());
        assert!(err.missing_fields().is_none());
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = ApiError::from(IntakeError::DiastolicAboveSystolic);
        assert_eq!(err.user_message(), "Diastolic value cannot be higher than systolic");
    }
}
