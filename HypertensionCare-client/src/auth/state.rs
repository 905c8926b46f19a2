use std::sync::Arc;

use tracing::{debug, warn};
use validator::Validate;

use hypertension_care_data::models::session::StoredSession;
use hypertension_care_data::repository::SessionRepository;
use hypertension_care_domain::entities::{AuthResponse, LoginRequest, RegisterRequest, UserSummary};
use hypertension_care_domain::routing::AuthView;
use hypertension_care_domain::services::IntakeError;

use super::logging::{log_failed_login, log_logout, log_registration, log_session_restored, log_successful_login};
use crate::error::ApiError;
use crate::services::AuthApi;

/// Shown when a login fails without a usable backend message
pub const LOGIN_FAILED: &str = "Login failed";

/// Shown when a registration fails without a usable backend message
pub const REGISTRATION_FAILED: &str = "Registration failed";

/// Who is signed in, backed by the persisted session.
///
/// `is_authenticated` only checks that a token is stored; the backend decides whether
/// it is still valid.
pub struct AuthState {
    api: Arc<dyn AuthApi>,
    session: SessionRepository,
    loading: bool,
    current_user: Option<UserSummary>,
    error: Option<String>,
}

impl AuthState {
    /// New holder; stays loading until [`AuthState::initialize`] runs
    pub fn new(api: Arc<dyn AuthApi>, session: SessionRepository) -> Self {
        Self {
            api,
            session,
            loading: true,
            current_user: None,
            error: None,
        }
    }

    /// Read the persisted user once at start-up
    pub fn initialize(&mut self) {
        match self.session.current_user() {
            Ok(Some(user)) => {
                log_session_restored(&user.username);
                self.current_user = Some(user.into());
            }
            Ok(None) => debug!("No persisted session"),
            Err(e) => warn!("Could not read the persisted session: {}", e),
        }
        self.loading = false;
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn current_user(&self) -> Option<&UserSummary> {
        self.current_user.as_ref()
    }

    /// Message of the last failed login or registration
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// What the route guard needs to know
    pub fn view(&self) -> AuthView<'_> {
        AuthView {
            loading: self.loading,
            current_user: self.current_user.as_ref(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated().unwrap_or_else(|e| {
            warn!("Could not read the stored token: {}", e);
            false
        })
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<UserSummary, ApiError> {
        self.loading = true;
        self.error = None;

        let result = self.authenticate(username, password).await;
        self.loading = false;

        match result {
            Ok(user) => {
                log_successful_login(&user.username);
                self.current_user = Some(user.clone());
                Ok(user)
            }
            Err(e) => {
                let message = e.user_message_or(LOGIN_FAILED);
                log_failed_login(username, &message);
                self.error = Some(message);
                Err(e)
            }
        }
    }

    /// Create an account. When the backend issues no token the holder signs in with the
    /// same credentials, so a successful registration always ends signed in.
    pub async fn register(&mut self, username: &str, email: &str, password: &str) -> Result<UserSummary, ApiError> {
        self.loading = true;
        self.error = None;

        let request = RegisterRequest {
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        let result = self.create_account(&request).await;
        self.loading = false;

        match result {
            Ok(Some(user)) => {
                log_registration(&user.username, true, None);
                self.current_user = Some(user.clone());
                Ok(user)
            }
            Ok(None) => {
                log_registration(&request.username, true, Some("no token issued, signing in"));
                self.login(&request.username, password).await
            }
            Err(e) => {
                let message = e.user_message_or(REGISTRATION_FAILED);
                log_registration(&request.username, false, Some(&message));
                self.error = Some(message);
                Err(e)
            }
        }
    }

    /// Forget the session
    pub fn logout(&mut self) {
        if let Err(e) = self.session.clear() {
            warn!("Could not clear the persisted session: {}", e);
        }
        let username = self.current_user.take().map(|u| u.username);
        self.error = None;
        log_logout(username.as_deref());
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<UserSummary, ApiError> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self.api.login(&request).await?;
        self.persist(response, username, LOGIN_FAILED)?
            .ok_or_else(|| ApiError::Rejected(LOGIN_FAILED.to_string()))
    }

    async fn create_account(&self, request: &RegisterRequest) -> Result<Option<UserSummary>, ApiError> {
        request.validate().map_err(IntakeError::from)?;

        let response = self.api.register(request).await?;
        self.persist(response, &request.username, REGISTRATION_FAILED)
    }

    /// Save the session carried by `response`, if any. A response flagged unsuccessful
    /// is an error even with a 2xx status.
    fn persist(
        &self,
        response: AuthResponse,
        username: &str,
        fallback: &str,
    ) -> Result<Option<UserSummary>, ApiError> {
        if response.success == Some(false) {
            let message = response.message.unwrap_or_else(|| fallback.to_string());
            return Err(ApiError::Rejected(message));
        }

        match response.into_session(username) {
            Some(session) => {
                self.session.save(&StoredSession::from(&session))?;
                Ok(Some(session.user))
            }
            None => Ok(None),
        }
    }
}
