use async_trait::async_trait;
use chrono::Local;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use hypertension_care_domain::entities::{
    Anomaly, BpAnalytics, BpReading, CreateBpReadingRequest, CreatedReading, GeneratedReport, ReportRange,
    ReportType,
};
use hypertension_care_domain::services::{UploadFile, UploadKind};

use super::fallback::{placeholder_analytics, placeholder_anomalies};
use crate::error::ApiError;
use crate::http::ApiClient;

/// Server-side default for the readings limit
pub const DEFAULT_READINGS_LIMIT: u32 = 100;

/// Filters for `GET /bp/readings`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadingQuery {
    /// `YYYY-MM-DD`
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<u32>,
}

impl ReadingQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(start) = &self.start_date {
            params.push(("start_date", start.clone()));
        }
        if let Some(end) = &self.end_date {
            params.push(("end_date", end.clone()));
        }
        params.push(("limit", self.limit.unwrap_or(DEFAULT_READINGS_LIMIT).to_string()));
        params
    }
}

/// A file picked for upload together with its contents
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub kind: UploadKind,
    pub file: UploadFile,
    pub contents: Vec<u8>,
}

/// Response of the upload endpoints
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UploadOutcome {
    #[serde(default)]
    pub readings_added: u32,

    /// Rows or images the backend could not turn into readings
    #[serde(default)]
    pub errors: Vec<Value>,
}

/// Analytics plus whether they are placeholder data
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsReport {
    pub analytics: BpAnalytics,
    pub placeholder: bool,
}

/// Anomalies plus whether they are placeholder data
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnomalyReport {
    pub anomalies: Vec<Anomaly>,
    /// Note from the backend, e.g. that detection is unavailable
    pub message: Option<String>,
    pub placeholder: bool,
}

/// Blood pressure endpoints under `/bp`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BloodPressureApi: Send + Sync {
    async fn readings(&self, query: &ReadingQuery) -> Result<Vec<BpReading>, ApiError>;

    async fn add_reading(&self, request: &CreateBpReadingRequest) -> Result<CreatedReading, ApiError>;

    async fn delete_reading(&self, reading_id: i64) -> Result<(), ApiError>;

    async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, ApiError>;

    /// Summary over the last `days` days
    async fn analytics(&self, days: u32) -> Result<AnalyticsReport, ApiError>;

    async fn anomalies(&self) -> Result<AnomalyReport, ApiError>;

    async fn generate_report(&self, report_type: ReportType, range: ReportRange) -> Result<GeneratedReport, ApiError>;

    async fn download_report(&self, report_path: &str) -> Result<Vec<u8>, ApiError>;
}

#[derive(Debug, Deserialize)]
struct ReadingsEnvelope {
    #[serde(default)]
    readings: Vec<BpReading>,
}

#[derive(Debug, Deserialize)]
struct AnalyticsEnvelope {
    #[serde(default)]
    analytics: BpAnalytics,
}

#[derive(Debug, Deserialize)]
struct AnomaliesEnvelope {
    #[serde(default)]
    anomalies: Vec<Anomaly>,
    #[serde(default)]
    message: Option<String>,
}

/// [`BloodPressureApi`] over HTTP
#[derive(Debug, Clone)]
pub struct BloodPressureService {
    client: ApiClient,
    mock_fallback: bool,
}

impl BloodPressureService {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            mock_fallback: false,
        }
    }

    /// Serve placeholder analytics and anomalies when the backend call fails
    pub fn with_mock_fallback(mut self, enabled: bool) -> Self {
        self.mock_fallback = enabled;
        self
    }

    fn fallback_allowed(&self, err: &ApiError) -> bool {
        self.mock_fallback && !err.is_cancelled()
    }
}

#[async_trait]
impl BloodPressureApi for BloodPressureService {
    #[instrument(skip(self))]
    async fn readings(&self, query: &ReadingQuery) -> Result<Vec<BpReading>, ApiError> {
        let envelope: ReadingsEnvelope = self.client.get_json("bp/readings", &query.params()).await?;
        Ok(envelope.readings)
    }

    #[instrument(skip(self, request))]
    async fn add_reading(&self, request: &CreateBpReadingRequest) -> Result<CreatedReading, ApiError> {
        let created: CreatedReading = self.client.post_json("bp/readings", request).await?;
        info!(
            "Saved reading {} ({}/{})",
            created.reading_id, request.systolic, request.diastolic
        );
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn delete_reading(&self, reading_id: i64) -> Result<(), ApiError> {
        let _: Value = self
            .client
            .delete_json(&format!("bp/readings/{}", reading_id))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, request), fields(file = %request.file.name))]
    async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, ApiError> {
        let mut part = Part::bytes(request.contents).file_name(request.file.name.clone());
        if let Some(content_type) = &request.file.content_type {
            part = part.mime_str(content_type.as_ref())?;
        }
        let form = Form::new().part("file", part);

        let path = format!("bp/upload/{}", request.kind.endpoint());
        let outcome: UploadOutcome = self.client.post_multipart(&path, form).await?;
        info!("Upload added {} reading(s)", outcome.readings_added);
        Ok(outcome)
    }

    #[instrument(skip(self))]
    async fn analytics(&self, days: u32) -> Result<AnalyticsReport, ApiError> {
        match self
            .client
            .get_json::<AnalyticsEnvelope>("bp/analytics", &[("days", days.to_string())])
            .await
        {
            Ok(envelope) => Ok(AnalyticsReport {
                analytics: envelope.analytics,
                placeholder: false,
            }),
            Err(e) if self.fallback_allowed(&e) => {
                warn!("Analytics unavailable ({}), serving placeholder data", e);
                Ok(AnalyticsReport {
                    analytics: placeholder_analytics(days, Local::now().date_naive()),
                    placeholder: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    async fn anomalies(&self) -> Result<AnomalyReport, ApiError> {
        match self.client.get_json::<AnomaliesEnvelope>("bp/anomalies", &[]).await {
            Ok(envelope) => Ok(AnomalyReport {
                anomalies: envelope.anomalies,
                message: envelope.message,
                placeholder: false,
            }),
            Err(e) if self.fallback_allowed(&e) => {
                warn!("Anomaly detection unavailable ({}), serving placeholder data", e);
                Ok(AnomalyReport {
                    anomalies: placeholder_anomalies(Local::now().date_naive()),
                    message: None,
                    placeholder: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    async fn generate_report(&self, report_type: ReportType, range: ReportRange) -> Result<GeneratedReport, ApiError> {
        let params = [
            ("type", report_type.as_str().to_string()),
            ("start_date", range.start_param()),
            ("end_date", range.end_param()),
        ];
        self.client.get_json("bp/report", &params).await
    }

    #[instrument(skip(self))]
    async fn download_report(&self, report_path: &str) -> Result<Vec<u8>, ApiError> {
        self.client
            .get_bytes("bp/report/download", &[("path", report_path.to_string())])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_query_params() {
        let query = ReadingQuery {
            start_date: Some("2024-01-01".to_string()),
            end_date: None,
            limit: None,
        };
        assert_eq!(
            query.params(),
            vec![
                ("start_date", "2024-01-01".to_string()),
                ("limit", "100".to_string())
            ]
        );
    }

    #[test]
    fn test_upload_outcome_tolerates_extra_fields() {
        let outcome: UploadOutcome = serde_json::from_str(
            r#"{"success": true, "readings_added": 3, "errors": ["Row 4: missing systolic"], "readings": []}"#,
        )
        .unwrap();
        assert_eq!(outcome.readings_added, 3);
        assert_eq!(outcome.errors.len(), 1);
    }
}
