use std::sync::Arc;

use tracing::warn;

use hypertension_care_domain::entities::{BpReading, CurrentUser, PredictionRecord};
use hypertension_care_domain::services::dashboard::{
    dashboard_cards, latest_prediction, latest_reading, DashboardCard, DashboardInputs,
};

use crate::cancel::ViewScope;
use crate::error::{ApiError, GENERIC_ERROR_MESSAGE};
use crate::services::{AuthApi, BloodPressureApi, PredictionApi, ReadingQuery, Services};

/// Dashboard: greeting plus the summary cards
pub struct DashboardPage {
    scope: ViewScope,
    auth: Arc<dyn AuthApi>,
    prediction: Arc<dyn PredictionApi>,
    blood_pressure: Arc<dyn BloodPressureApi>,
    loading: bool,
    error: Option<String>,
    user: Option<CurrentUser>,
    predictions: Vec<PredictionRecord>,
    readings: Vec<BpReading>,
}

impl DashboardPage {
    pub fn new(services: &Services) -> Self {
        Self {
            scope: ViewScope::new(),
            auth: Arc::clone(&services.auth),
            prediction: Arc::clone(&services.prediction),
            blood_pressure: Arc::clone(&services.blood_pressure),
            loading: false,
            error: None,
            user: None,
            predictions: Vec::new(),
            readings: Vec::new(),
        }
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    /// Fetch the user, prediction history and readings concurrently.
    ///
    /// Each source is optional; a card without data shows "N/A". The page only reports
    /// an error when every source failed.
    pub async fn load(&mut self) -> Result<(), ApiError> {
        self.loading = true;
        self.error = None;

        let query = ReadingQuery::default();
        let (user, history, readings) = futures::join!(
            self.scope.run(self.auth.current_user()),
            self.scope.run(self.prediction.history()),
            self.scope.run(self.blood_pressure.readings(&query)),
        );
        self.loading = false;

        if [user.as_ref().err(), history.as_ref().err(), readings.as_ref().err()]
            .iter()
            .flatten()
            .any(|e| e.is_cancelled())
        {
            return Err(ApiError::Cancelled);
        }

        let all_failed = user.is_err() && history.is_err() && readings.is_err();

        self.user = keep_or_warn("current user", user);
        self.predictions = keep_or_warn("prediction history", history).unwrap_or_default();
        self.readings = keep_or_warn("readings", readings).unwrap_or_default();

        if all_failed {
            self.error = Some(GENERIC_ERROR_MESSAGE.to_string());
        }
        Ok(())
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    /// Risk, last reading, medication adherence and next reminder.
    ///
    /// The backend has no medication endpoints, so those two cards always show "N/A".
    pub fn cards(&self) -> Vec<DashboardCard> {
        dashboard_cards(&DashboardInputs {
            latest_prediction: latest_prediction(&self.predictions),
            latest_reading: latest_reading(&self.readings),
            medication_adherence: None,
            next_reminder: None,
        })
    }
}

fn keep_or_warn<T>(what: &str, result: Result<T, ApiError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Dashboard could not load {}: {}", what, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::MockAuthApi;
    use crate::services::blood_pressure::MockBloodPressureApi;
    use crate::services::prediction::MockPredictionApi;
    use crate::services::profile::MockProfileApi;
    use hypertension_care_domain::services::dashboard::NOT_AVAILABLE;

    fn services(auth: MockAuthApi, prediction: MockPredictionApi, bp: MockBloodPressureApi) -> Services {
        Services {
            auth: Arc::new(auth),
            prediction: Arc::new(prediction),
            blood_pressure: Arc::new(bp),
            profile: Arc::new(MockProfileApi::new()),
        }
    }

    fn reading(id: i64, systolic: i32, diastolic: i32, date: &str) -> BpReading {
        serde_json::from_value(serde_json::json!({
            "id": id, "systolic": systolic, "diastolic": diastolic, "measurement_date": date
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_cards_use_latest_data() {
        let mut auth = MockAuthApi::new();
        auth.expect_current_user().returning(|| {
            Ok(CurrentUser {
                id: 1,
                username: "ada".to_string(),
                email: None,
                role: None,
            })
        });

        let mut prediction = MockPredictionApi::new();
        prediction.expect_history().returning(|| {
            Ok(vec![serde_json::from_value(serde_json::json!({
                "prediction_score": 63.4, "risk_level": "High", "prediction_date": "2024-02-01 09:00:00"
            }))
            .unwrap()])
        });

        let mut bp = MockBloodPressureApi::new();
        bp.expect_readings().returning(|_| {
            Ok(vec![
                reading(1, 150, 95, "2024-02-01T08:00:00"),
                reading(2, 121, 79, "2024-02-03T08:00:00"),
            ])
        });

        let mut page = DashboardPage::new(&services(auth, prediction, bp));
        page.load().await.unwrap();

        let cards = page.cards();
        assert_eq!(cards[0].value, "63");
        assert_eq!(cards[1].value, "121/79");
        assert_eq!(cards[2].value, NOT_AVAILABLE);
        assert_eq!(cards[3].value, NOT_AVAILABLE);
        assert_eq!(page.user().map(|u| u.username.as_str()), Some("ada"));
        assert!(page.error().is_none());
    }

    #[tokio::test]
    async fn test_partial_failure_degrades_to_not_available() {
        let mut auth = MockAuthApi::new();
        auth.expect_current_user()
            .returning(|| Err(ApiError::from_response(500, "")));
        let mut prediction = MockPredictionApi::new();
        prediction.expect_history().returning(|| Ok(Vec::new()));
        let mut bp = MockBloodPressureApi::new();
        bp.expect_readings()
            .returning(|_| Err(ApiError::Network("timed out".to_string())));

        let mut page = DashboardPage::new(&services(auth, prediction, bp));
        page.load().await.unwrap();

        assert!(page.cards().iter().all(|card| card.value == NOT_AVAILABLE));
        assert!(page.error().is_none());
    }
}
