use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use hypertension_care_domain::entities::{PatientIntakePayload, PredictionHistoryPayload, PredictionRecord};

use crate::error::ApiError;
use crate::http::{not_found_as_none, ApiClient};

/// Prediction endpoints under `/prediction`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PredictionApi: Send + Sync {
    /// Previously saved intake data, `None` when nothing was saved yet
    async fn patient_data(&self) -> Result<Option<Map<String, Value>>, ApiError>;

    async fn save_patient_data(&self, payload: &PatientIntakePayload) -> Result<(), ApiError>;

    /// Ask the backend to score the saved intake data
    async fn predict(&self, payload: &PatientIntakePayload) -> Result<PredictionRecord, ApiError>;

    /// Past predictions, empty when there are none
    async fn history(&self) -> Result<Vec<PredictionRecord>, ApiError>;
}

#[derive(Debug, Deserialize)]
struct PatientDataEnvelope {
    #[serde(default)]
    patient_data: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct PredictionEnvelope {
    prediction: PredictionRecord,
}

#[derive(Debug, Deserialize)]
struct HistoryEnvelope {
    #[serde(default)]
    prediction_history: Option<PredictionHistoryPayload>,
}

/// [`PredictionApi`] over HTTP
#[derive(Debug, Clone)]
pub struct PredictionService {
    client: ApiClient,
}

impl PredictionService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PredictionApi for PredictionService {
    #[instrument(skip(self))]
    async fn patient_data(&self) -> Result<Option<Map<String, Value>>, ApiError> {
        let envelope: Option<PatientDataEnvelope> =
            not_found_as_none(self.client.get_json("prediction/patient-data", &[]).await)?;
        Ok(envelope.and_then(|e| e.patient_data))
    }

    #[instrument(skip(self, payload))]
    async fn save_patient_data(&self, payload: &PatientIntakePayload) -> Result<(), ApiError> {
        let _: Value = self.client.post_json("prediction/patient-data", payload).await?;
        Ok(())
    }

    #[instrument(skip(self, payload))]
    async fn predict(&self, payload: &PatientIntakePayload) -> Result<PredictionRecord, ApiError> {
        let envelope: PredictionEnvelope = self.client.post_json("prediction/predict", payload).await?;
        info!(
            "Prediction received: {:.1}% ({})",
            envelope.prediction.prediction_score, envelope.prediction.risk_level
        );
        Ok(envelope.prediction)
    }

    #[instrument(skip(self))]
    async fn history(&self) -> Result<Vec<PredictionRecord>, ApiError> {
        let envelope: Option<HistoryEnvelope> =
            not_found_as_none(self.client.get_json("prediction/history", &[]).await)?;
        Ok(envelope
            .and_then(|e| e.prediction_history)
            .map(PredictionHistoryPayload::into_records)
            .unwrap_or_default())
    }
}
