// Service wrappers, one per backend area. Each exposes a trait so page controllers
// can be exercised without a backend.
pub mod auth;
pub mod blood_pressure;
pub mod fallback;
pub mod prediction;
pub mod profile;

use std::sync::Arc;

pub use auth::{AuthApi, AuthService};
pub use blood_pressure::{
    AnalyticsReport, AnomalyReport, BloodPressureApi, BloodPressureService, ReadingQuery, UploadOutcome,
    UploadRequest,
};
pub use prediction::{PredictionApi, PredictionService};
pub use profile::{ProfileApi, ProfileService};

use crate::http::ApiClient;

/// Every service a page may need, shared behind trait objects
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<dyn AuthApi>,
    pub prediction: Arc<dyn PredictionApi>,
    pub blood_pressure: Arc<dyn BloodPressureApi>,
    pub profile: Arc<dyn ProfileApi>,
}

impl Services {
    /// HTTP-backed services sharing one client
    pub fn http(client: ApiClient, analytics_mock_fallback: bool) -> Self {
        Self {
            auth: Arc::new(AuthService::new(client.clone())),
            prediction: Arc::new(PredictionService::new(client.clone())),
            blood_pressure: Arc::new(
                BloodPressureService::new(client.clone()).with_mock_fallback(analytics_mock_fallback),
            ),
            profile: Arc::new(ProfileService::new(client)),
        }
    }
}
