use std::sync::Arc;

use indexmap::IndexMap;

use hypertension_care_domain::entities::PredictionRecord;
use hypertension_care_domain::services::analytics::{
    latest_feature_importances, prediction_series, risk_distribution, risk_factor_counts, score_trend,
    FeatureImportance, ScorePoint, Trend, DEFAULT_TOP_FEATURES,
};

use crate::cancel::ViewScope;
use crate::error::ApiError;
use crate::services::{PredictionApi, Services};

/// Prediction history page: timeline, distributions and feature ranking
pub struct HistoryPage {
    scope: ViewScope,
    prediction: Arc<dyn PredictionApi>,
    records: Vec<PredictionRecord>,
    error: Option<String>,
}

impl HistoryPage {
    pub fn new(services: &Services) -> Self {
        Self {
            scope: ViewScope::new(),
            prediction: Arc::clone(&services.prediction),
            records: Vec::new(),
            error: None,
        }
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub async fn load(&mut self) -> Result<(), ApiError> {
        self.error = None;
        match self.scope.run(self.prediction.history()).await {
            Ok(records) => {
                self.records = records;
                Ok(())
            }
            Err(e) => {
                if !e.is_cancelled() {
                    self.error = Some(e.user_message());
                }
                Err(e)
            }
        }
    }

    pub fn records(&self) -> &[PredictionRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn timeline(&self) -> Vec<ScorePoint> {
        prediction_series(&self.records)
    }

    pub fn trend(&self) -> Option<Trend> {
        score_trend(&self.records)
    }

    pub fn risk_levels(&self) -> IndexMap<String, usize> {
        risk_distribution(&self.records)
    }

    pub fn risk_factors(&self) -> IndexMap<String, usize> {
        risk_factor_counts(&self.records)
    }

    pub fn top_features(&self) -> Vec<FeatureImportance> {
        latest_feature_importances(&self.records, DEFAULT_TOP_FEATURES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::MockAuthApi;
    use crate::services::blood_pressure::MockBloodPressureApi;
    use crate::services::prediction::MockPredictionApi;
    use crate::services::profile::MockProfileApi;
    use hypertension_care_domain::services::analytics::TrendDirection;
    use serde_json::json;

    fn page(prediction: MockPredictionApi) -> HistoryPage {
        HistoryPage::new(&Services {
            auth: Arc::new(MockAuthApi::new()),
            prediction: Arc::new(prediction),
            blood_pressure: Arc::new(MockBloodPressureApi::new()),
            profile: Arc::new(MockProfileApi::new()),
        })
    }

    #[tokio::test]
    async fn test_history_aggregates() {
        let mut prediction = MockPredictionApi::new();
        prediction.expect_history().returning(|| {
            Ok(serde_json::from_value(json!([
                {"prediction_score": 55, "risk_level": "High", "prediction_date": "2024-03-01 10:00:00",
                 "key_factors": ["Smoking", "High blood pressure"],
                 "feature_importances": {"sysBP": 0.4, "age": "0.2", "note": "n/a"}},
                {"prediction_score": 30, "risk_level": "Moderate", "prediction_date": "2024-01-01 10:00:00",
                 "key_factors": ["Smoking"],
                 "feature_importances": {"glucose": 0.9}},
                {"prediction_score": 12, "risk_level": "Low", "prediction_date": "not a date"}
            ]))
            .unwrap())
        });

        let mut page = page(prediction);
        page.load().await.unwrap();

        assert_eq!(page.timeline().len(), 2);
        let trend = page.trend().unwrap();
        assert_eq!(trend.direction, TrendDirection::Worsening);
        assert_eq!(trend.delta, 25.0);

        // Undated records sort first
        let levels: Vec<String> = page.risk_levels().into_keys().collect();
        assert_eq!(levels, vec!["Low", "Moderate", "High"]);

        assert_eq!(page.risk_factors().get("Smoking"), Some(&2));

        let features = page.top_features();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].label, "Sys B P");
    }

    #[tokio::test]
    async fn test_failure_sets_error() {
        let mut prediction = MockPredictionApi::new();
        prediction
            .expect_history()
            .returning(|| Err(ApiError::Network("connection reset".to_string())));

        let mut page = page(prediction);
        assert!(page.load().await.is_err());
        assert_eq!(page.error(), Some(crate::error::GENERIC_ERROR_MESSAGE));
        assert!(page.is_empty());
    }
}
