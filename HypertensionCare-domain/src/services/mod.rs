// Services that implement the client-side rules
pub mod analytics;
pub mod dashboard;
pub mod insights;
pub mod intake;
pub mod pagination;
pub mod palette;

pub use insights::{calculate_reading_stats, categorize_blood_pressure};
pub use intake::{validate_reading, validate_upload, IntakeError, UploadFile, UploadKind};
