//! Blood pressure tracker page.
//!
//! Holds the fetched readings and the entry form. Every mutation (add, delete,
//! upload) is followed by a full refetch, so the table never shows locally patched
//! data.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use tracing::{debug, info};

use hypertension_care_domain::entities::anomaly::MIN_READINGS_FOR_ANOMALIES;
use hypertension_care_domain::entities::{
    BpReading, BpReadingForm, CreatedReading, GeneratedReport, ReadingStats, ReportRange, ReportRangePreset,
    ReportType, TimeRange,
};
use hypertension_care_domain::services::analytics::{
    category_distribution, filter_by_time_range, reading_series, systolic_trend, ReadingPoint, Trend,
};
use hypertension_care_domain::services::pagination::{Paginator, SortColumn, SortState};
use hypertension_care_domain::services::{
    calculate_reading_stats, validate_reading, validate_upload, IntakeError, UploadFile, UploadKind,
};

use crate::cancel::ViewScope;
use crate::error::ApiError;
use crate::services::{AnalyticsReport, AnomalyReport, BloodPressureApi, ReadingQuery, Services, UploadOutcome, UploadRequest};

pub struct BpTrackerPage {
    scope: ViewScope,
    api: Arc<dyn BloodPressureApi>,
    readings: Vec<BpReading>,
    form: BpReadingForm,
    sort: SortState,
    page: usize,
    error: Option<String>,
    notice: Option<String>,
}

impl BpTrackerPage {
    /// New page with the entry form stamped at `now`
    pub fn new(services: &Services, now: NaiveDateTime) -> Self {
        Self {
            scope: ViewScope::new(),
            api: Arc::clone(&services.blood_pressure),
            readings: Vec::new(),
            form: BpReadingForm::new(now),
            sort: SortState::default(),
            page: 1,
            error: None,
            notice: None,
        }
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub fn readings(&self) -> &[BpReading] {
        &self.readings
    }

    pub fn form(&self) -> &BpReadingForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut BpReadingForm {
        &mut self.form
    }

    /// Last failure, shown inline
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Last success message
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    fn record_failure(&mut self, err: &ApiError) {
        if !err.is_cancelled() {
            self.error = Some(err.user_message());
        }
    }

    /// Fetch the reading list
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        let query = ReadingQuery::default();
        match self.scope.run(self.api.readings(&query)).await {
            Ok(readings) => {
                debug!("Loaded {} readings", readings.len());
                self.readings = readings;
                self.page = Paginator::new(self.readings.len()).clamp_page(self.page);
                Ok(())
            }
            Err(e) => {
                self.record_failure(&e);
                Err(e)
            }
        }
    }

    /// Validate and submit the entry form; on success the form resets to `now`
    pub async fn submit_reading(&mut self, now: NaiveDateTime) -> Result<CreatedReading, ApiError> {
        self.error = None;
        self.notice = None;

        let request = validate_reading(&self.form).map_err(|e| {
            self.error = Some(e.to_string());
            ApiError::from(e)
        })?;

        let created = match self.scope.run(self.api.add_reading(&request)).await {
            Ok(created) => created,
            Err(e) => {
                self.record_failure(&e);
                return Err(e);
            }
        };

        self.form.reset(now);
        self.notice = Some(match created.category.as_deref() {
            Some(category) => format!("Reading saved ({})", category),
            None => "Reading saved".to_string(),
        });
        self.refresh().await?;
        Ok(created)
    }

    pub async fn delete_reading(&mut self, reading_id: i64) -> Result<(), ApiError> {
        self.error = None;
        if let Err(e) = self.scope.run(self.api.delete_reading(reading_id)).await {
            self.record_failure(&e);
            return Err(e);
        }

        info!("Deleted reading {}", reading_id);
        self.notice = Some("Reading deleted".to_string());
        self.refresh().await
    }

    /// Check and send a CSV or image file
    pub async fn upload(
        &mut self,
        kind: UploadKind,
        file: Option<UploadFile>,
        contents: Vec<u8>,
    ) -> Result<UploadOutcome, ApiError> {
        self.error = None;
        self.notice = None;

        let checked = validate_upload(kind, file.as_ref()).and_then(|()| file.ok_or(IntakeError::MissingFile));
        let file = match checked {
            Ok(file) => file,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e.into());
            }
        };

        let request = UploadRequest { kind, file, contents };
        let outcome = match self.scope.run(self.api.upload(request)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.record_failure(&e);
                return Err(e);
            }
        };

        self.notice = Some(format!("Added {} readings.", outcome.readings_added));
        self.refresh().await?;
        Ok(outcome)
    }

    /// Server-side analytics for the last `days` days
    pub async fn analytics(&self, days: u32) -> Result<AnalyticsReport, ApiError> {
        self.scope.run(self.api.analytics(days)).await
    }

    /// Anomalies, or `None` while there are too few readings to ask for them
    pub async fn anomalies(&self) -> Result<Option<AnomalyReport>, ApiError> {
        if self.readings.len() < MIN_READINGS_FOR_ANOMALIES {
            debug!(
                "Skipping anomaly detection: {} of {} readings",
                self.readings.len(),
                MIN_READINGS_FOR_ANOMALIES
            );
            return Ok(None);
        }

        self.scope.run(self.api.anomalies()).await.map(Some)
    }

    /// Resolve the report range and ask the backend to generate the report
    pub async fn generate_report(
        &mut self,
        report_type: ReportType,
        preset: ReportRangePreset,
        today: NaiveDate,
        custom: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<GeneratedReport, ApiError> {
        self.error = None;
        let range = ReportRange::resolve(preset, today, custom).map_err(|e| {
            self.error = Some(e.to_string());
            ApiError::from(e)
        })?;

        match self.scope.run(self.api.generate_report(report_type, range)).await {
            Ok(report) => Ok(report),
            Err(e) => {
                self.record_failure(&e);
                Err(e)
            }
        }
    }

    pub async fn download_report(&self, report_path: &str) -> Result<Vec<u8>, ApiError> {
        self.scope.run(self.api.download_report(report_path)).await
    }

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    /// Column header click
    pub fn toggle_sort(&mut self, column: SortColumn) {
        self.sort.toggle(column);
        self.page = 1;
    }

    pub fn current_page(&self) -> usize {
        self.page
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = self.paginator().clamp_page(page);
    }

    pub fn paginator(&self) -> Paginator {
        Paginator::new(self.readings.len())
    }

    /// Rows of the current page in the current sort order
    pub fn table_rows(&self) -> Vec<BpReading> {
        let mut sorted = self.readings.clone();
        self.sort.sort(&mut sorted);
        self.paginator().page_items(&sorted, self.page).to_vec()
    }

    pub fn page_buttons(&self) -> Vec<usize> {
        self.paginator().page_window(self.page)
    }

    /// Chart series for the readings inside `range`
    pub fn chart(&self, range: TimeRange, now: NaiveDateTime) -> Vec<ReadingPoint> {
        reading_series(&filter_by_time_range(&self.readings, range, now))
    }

    pub fn stats(&self, range: TimeRange, now: NaiveDateTime) -> Option<ReadingStats> {
        calculate_reading_stats(&filter_by_time_range(&self.readings, range, now))
    }

    pub fn trend(&self, range: TimeRange, now: NaiveDateTime) -> Option<Trend> {
        systolic_trend(&filter_by_time_range(&self.readings, range, now))
    }

    pub fn categories(&self) -> IndexMap<String, usize> {
        category_distribution(&self.readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::MockAuthApi;
    use crate::services::blood_pressure::MockBloodPressureApi;
    use crate::services::prediction::MockPredictionApi;
    use crate::services::profile::MockProfileApi;
    use hypertension_care_domain::services::pagination::SortOrder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, 30)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap()
    }

    fn reading(id: i64, systolic: i32, day: u32) -> BpReading {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "systolic": systolic,
            "diastolic": 80,
            "measurement_date": format!("2024-04-{:02}T08:00:00", day),
            "category": "Hypertension Stage 1"
        }))
        .unwrap()
    }

    fn page(api: MockBloodPressureApi) -> BpTrackerPage {
        BpTrackerPage::new(
            &Services {
                auth: Arc::new(MockAuthApi::new()),
                prediction: Arc::new(MockPredictionApi::new()),
                blood_pressure: Arc::new(api),
                profile: Arc::new(MockProfileApi::new()),
            },
            now(),
        )
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_backend() {
        let mut page = page(MockBloodPressureApi::new());
        page.form_mut().systolic = "120".to_string();
        page.form_mut().diastolic = "130".to_string();

        let err = page.submit_reading(now()).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(page.error(), Some("Diastolic value cannot be higher than systolic"));
    }

    #[tokio::test]
    async fn test_submit_resets_form_and_refetches() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fetches);

        let mut api = MockBloodPressureApi::new();
        api.expect_add_reading()
            .withf(|request| request.systolic == 135 && request.pulse == Some(72))
            .times(1)
            .returning(|_| {
                Ok(CreatedReading {
                    reading_id: 9,
                    is_abnormal: true,
                    category: Some("Hypertension Stage 1".to_string()),
                })
            });
        api.expect_readings().returning(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec![reading(9, 135, 29)])
        });

        let mut page = page(api);
        page.form_mut().systolic = "135".to_string();
        page.form_mut().diastolic = "85".to_string();
        page.form_mut().pulse = "72".to_string();
        page.form_mut().measurement_time = "Evening".to_string();

        let created = page.submit_reading(now()).await.unwrap();
        assert_eq!(created.reading_id, 9);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(page.readings().len(), 1);
        assert!(page.form().systolic.is_empty());
        assert_eq!(page.form().measurement_time, "Morning");
        assert_eq!(page.notice(), Some("Reading saved (Hypertension Stage 1)"));
    }

    #[tokio::test]
    async fn test_upload_validation_and_refetch() {
        let mut api = MockBloodPressureApi::new();
        api.expect_upload().times(1).returning(|request| {
            assert_eq!(request.kind, UploadKind::Csv);
            Ok(UploadOutcome {
                readings_added: 4,
                errors: Vec::new(),
            })
        });
        api.expect_readings().times(1).returning(|_| Ok(Vec::new()));

        let mut page = page(api);

        let err = page.upload(UploadKind::Csv, None, Vec::new()).await.unwrap_err();
        assert_eq!(err.user_message(), "Please select a file to upload");

        assert!(page
            .upload(UploadKind::Csv, Some(UploadFile::from_name("readings.txt")), Vec::new())
            .await
            .is_err());

        let outcome = page
            .upload(
                UploadKind::Csv,
                Some(UploadFile::from_name("Readings.CSV")),
                b"systolic,diastolic\n120,80\n".to_vec(),
            )
            .await
            .unwrap();
        assert_eq!(outcome.readings_added, 4);
        assert_eq!(page.notice(), Some("Added 4 readings."));
    }

    #[tokio::test]
    async fn test_anomalies_need_five_readings() {
        let mut api = MockBloodPressureApi::new();
        api.expect_readings()
            .returning(|_| Ok((1..=4).map(|i| reading(i, 120 + i as i32, i as u32)).collect()));

        let mut page = page(api);
        page.refresh().await.unwrap();
        // No anomaly expectation: asking the backend would panic
        assert!(page.anomalies().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_table_sorting_and_paging() {
        let mut api = MockBloodPressureApi::new();
        api.expect_readings()
            .returning(|_| Ok((1..=23).map(|i| reading(i, 100 + i as i32, i as u32)).collect()));

        let mut page = page(api);
        page.refresh().await.unwrap();

        // Newest first by default
        assert_eq!(page.table_rows()[0].id, 23);
        assert_eq!(page.paginator().total_pages(), 3);

        page.toggle_sort(SortColumn::Systolic);
        assert_eq!(page.sort_state().order, SortOrder::Asc);
        assert_eq!(page.table_rows()[0].systolic, 101);

        page.set_page(7);
        assert_eq!(page.current_page(), 3);
        assert_eq!(page.table_rows().len(), 3);
        assert_eq!(page.page_buttons(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_report_range_is_checked_locally() {
        let mut page = page(MockBloodPressureApi::new());
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

        let err = page
            .generate_report(ReportType::Pdf, ReportRangePreset::Custom, end, Some((start, end)))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Start date cannot be after end date");
        assert_eq!(page.error(), Some("Start date cannot be after end date"));
    }

    #[tokio::test]
    async fn test_stats_follow_time_range() {
        let mut api = MockBloodPressureApi::new();
        api.expect_readings()
            .returning(|_| Ok(vec![reading(1, 150, 1), reading(2, 130, 28), reading(3, 120, 29)]));

        let mut page = page(api);
        page.refresh().await.unwrap();

        let week = page.stats(TimeRange::Week, now()).unwrap();
        assert_eq!(week.reading_count, 2);
        assert_eq!(week.max_systolic, 130);

        assert_eq!(page.stats(TimeRange::Month, now()).unwrap().reading_count, 3);
        assert_eq!(page.chart(TimeRange::All, now()).len(), 3);
        assert_eq!(page.categories().get("Hypertension Stage 1"), Some(&3));
    }
}
