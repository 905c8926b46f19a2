// Domain entities and value objects
pub mod anomaly;
pub mod blood_pressure;
pub mod prediction;
pub mod profile;
pub mod report;
pub mod session;
pub mod timestamp;

#[cfg(feature = "with-data")]
pub mod conversions;

// Re-export common types for easier imports
pub use anomaly::{Anomaly, AnomalyId, AnomalySeverity};
pub use blood_pressure::{
    BloodPressureCategory, BpAnalytics, BpReading, BpReadingForm, CreateBpReadingRequest, CreatedReading,
    ReadingStats, TimeRange,
};
pub use prediction::{
    PatientIntakeForm, PatientIntakePayload, PredictionHistoryPayload, PredictionRecord, RiskLevel,
};
pub use profile::{calculate_bmi, BmiCategory, PatientProfile, ProfileForm, ProfilePayload};
pub use report::{GeneratedReport, ReportRange, ReportRangePreset, ReportType};
pub use session::{AuthResponse, CurrentUser, LoginRequest, RegisterRequest, Session, UserSummary};
pub use timestamp::parse_timestamp;
