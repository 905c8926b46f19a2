use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use hypertension_care_domain::entities::{AuthResponse, CurrentUser, LoginRequest, RegisterRequest};

use crate::error::ApiError;
use crate::http::ApiClient;

/// Authentication endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError>;

    /// `POST /auth/register`
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError>;

    /// `GET /auth/me`
    async fn current_user(&self) -> Result<CurrentUser, ApiError>;
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: CurrentUser,
}

/// [`AuthApi`] over HTTP
#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthApi for AuthService {
    #[instrument(skip(self, request), fields(username = %request.username))]
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.client.post_json("auth/login", request).await
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.client.post_json("auth/register", request).await
    }

    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        let envelope: UserEnvelope = self.client.get_json("auth/me", &[]).await?;
        Ok(envelope.user)
    }
}
