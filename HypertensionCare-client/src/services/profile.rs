use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use hypertension_care_domain::entities::{PatientProfile, ProfilePayload};

use crate::error::ApiError;
use crate::http::{not_found_as_none, ApiClient};

/// Profile endpoints under `/user-profile`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileApi: Send + Sync {
    /// The stored profile, `None` when the user has none yet
    async fn get_profile(&self) -> Result<Option<PatientProfile>, ApiError>;

    async fn create_profile(&self, payload: &ProfilePayload) -> Result<PatientProfile, ApiError>;

    async fn update_profile(&self, payload: &ProfilePayload) -> Result<PatientProfile, ApiError>;

    /// Delete the profile; returns the backend's confirmation message
    async fn delete_profile(&self) -> Result<Option<String>, ApiError>;
}

#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
    #[serde(default)]
    profile: Option<PatientProfile>,
}

#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    #[serde(default)]
    message: Option<String>,
}

/// [`ProfileApi`] over HTTP
#[derive(Debug, Clone)]
pub struct ProfileService {
    client: ApiClient,
}

impl ProfileService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn unwrap_profile(envelope: ProfileEnvelope) -> Result<PatientProfile, ApiError> {
        envelope
            .profile
            .ok_or_else(|| ApiError::Decode("response carried no profile".to_string()))
    }
}

#[async_trait]
impl ProfileApi for ProfileService {
    #[instrument(skip(self))]
    async fn get_profile(&self) -> Result<Option<PatientProfile>, ApiError> {
        let envelope: Option<ProfileEnvelope> =
            not_found_as_none(self.client.get_json("user-profile", &[]).await)?;
        Ok(envelope.and_then(|e| e.profile))
    }

    #[instrument(skip(self, payload))]
    async fn create_profile(&self, payload: &ProfilePayload) -> Result<PatientProfile, ApiError> {
        let envelope = self.client.post_json("user-profile", payload).await?;
        Self::unwrap_profile(envelope)
    }

    #[instrument(skip(self, payload))]
    async fn update_profile(&self, payload: &ProfilePayload) -> Result<PatientProfile, ApiError> {
        let envelope = self.client.put_json("user-profile", payload).await?;
        Self::unwrap_profile(envelope)
    }

    #[instrument(skip(self))]
    async fn delete_profile(&self) -> Result<Option<String>, ApiError> {
        let envelope: MessageEnvelope = self.client.delete_json("user-profile").await?;
        Ok(envelope.message)
    }
}
