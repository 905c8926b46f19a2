use mime::Mime;
use thiserror::Error;
use validator::ValidationErrors;

use crate::entities::blood_pressure::{BpReadingForm, CreateBpReadingRequest};

/// Local validation failures, reported before anything is sent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    #[error("Systolic and diastolic values are required")]
    MissingPressure,

    #[error("Blood pressure values must be numbers")]
    NonNumericPressure,

    #[error("Systolic value must be between 70 and 250")]
    SystolicOutOfRange,

    #[error("Diastolic value must be between 40 and 150")]
    DiastolicOutOfRange,

    #[error("Diastolic value cannot be higher than systolic")]
    DiastolicAboveSystolic,

    #[error("Pulse must be a number between 30 and 220")]
    InvalidPulse,

    #[error("Please select a file to upload")]
    MissingFile,

    #[error("Please select a CSV file")]
    NotCsv,

    #[error("Please select a valid image file (JPG, PNG, BMP, TIFF)")]
    UnsupportedImage,

    #[error("Start date cannot be after end date")]
    InvalidDateRange,

    /// A numeric form field held text that is not a number
    #[error("{field} must be a number")]
    NotNumeric { field: String },

    #[error("{0}")]
    Validation(String),
}

impl From<ValidationErrors> for IntakeError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);

        let message = fields
            .iter()
            .map(|(field, errs)| {
                let msgs: Vec<String> = errs
                    .iter()
                    .map(|err| match &err.message {
                        Some(msg) => msg.to_string(),
                        None => format!("Invalid {}", field),
                    })
                    .collect();
                msgs.join(", ")
            })
            .collect::<Vec<String>>()
            .join("; ");

        IntakeError::Validation(message)
    }
}

/// Parse an optional whole-number field; blank text means "not provided"
pub fn parse_optional_int(field: &str, raw: &str) -> Result<Option<u32>, IntakeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<u32>().map(Some).map_err(|_| IntakeError::NotNumeric {
        field: field.to_string(),
    })
}

/// Parse an optional decimal field; blank text means "not provided"
pub fn parse_optional_float(field: &str, raw: &str) -> Result<Option<f64>, IntakeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(IntakeError::NotNumeric {
            field: field.to_string(),
        }),
    }
}

/// Validate the reading form and normalise it for submission.
///
/// Rules are checked in order and the first violation is returned.
pub fn validate_reading(form: &BpReadingForm) -> Result<CreateBpReadingRequest, IntakeError> {
    let systolic_raw = form.systolic.trim();
    let diastolic_raw = form.diastolic.trim();

    if systolic_raw.is_empty() || diastolic_raw.is_empty() {
        return Err(IntakeError::MissingPressure);
    }

    let (systolic, diastolic) = match (systolic_raw.parse::<i32>(), diastolic_raw.parse::<i32>()) {
        (Ok(s), Ok(d)) => (s, d),
        _ => return Err(IntakeError::NonNumericPressure),
    };

    if !(70..=250).contains(&systolic) {
        return Err(IntakeError::SystolicOutOfRange);
    }

    if !(40..=150).contains(&diastolic) {
        return Err(IntakeError::DiastolicOutOfRange);
    }

    if diastolic > systolic {
        return Err(IntakeError::DiastolicAboveSystolic);
    }

    let pulse_raw = form.pulse.trim();
    let pulse = if pulse_raw.is_empty() {
        None
    } else {
        match pulse_raw.parse::<i32>() {
            Ok(p) if (30..=220).contains(&p) => Some(p),
            _ => return Err(IntakeError::InvalidPulse),
        }
    };

    Ok(CreateBpReadingRequest {
        systolic,
        diastolic,
        pulse,
        measurement_date: form.measurement_date.clone(),
        measurement_time: form.measurement_time.clone(),
        notes: form.notes.trim().to_string(),
        source: form.source.clone(),
    })
}

/// The two mutually exclusive upload modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Csv,
    Image,
}

impl UploadKind {
    /// Endpoint segment under `/bp/upload/`
    pub fn endpoint(&self) -> &'static str {
        match self {
            UploadKind::Csv => "csv",
            UploadKind::Image => "image",
        }
    }
}

/// A file picked for upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: Option<Mime>,
}

impl UploadFile {
    /// Describe a file by name, guessing its content type from the extension
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let content_type = guess_mime(&name);
        Self { name, content_type }
    }
}

fn extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    Some(ext.to_lowercase())
}

/// Content type for the extensions the upload form deals with
pub fn guess_mime(name: &str) -> Option<Mime> {
    match extension(name)?.as_str() {
        "csv" => Some(mime::TEXT_CSV),
        "jpg" | "jpeg" => Some(mime::IMAGE_JPEG),
        "png" => Some(mime::IMAGE_PNG),
        "bmp" => Some(mime::IMAGE_BMP),
        "tif" | "tiff" => "image/tiff".parse().ok(),
        _ => None,
    }
}

fn is_allowed_image(content_type: &Mime) -> bool {
    content_type.type_() == mime::IMAGE
        && matches!(content_type.subtype().as_str(), "jpeg" | "png" | "bmp" | "tiff")
}

/// Check a picked file against the upload mode before it is sent
pub fn validate_upload(kind: UploadKind, file: Option<&UploadFile>) -> Result<(), IntakeError> {
    let file = file.ok_or(IntakeError::MissingFile)?;

    match kind {
        UploadKind::Csv => {
            if extension(&file.name).as_deref() != Some("csv") {
                return Err(IntakeError::NotCsv);
            }
        }
        UploadKind::Image => {
            let allowed = file.content_type.as_ref().map_or(false, is_allowed_image);
            if !allowed {
                return Err(IntakeError::UnsupportedImage);
            }
        }
    }

    Ok(())
}
