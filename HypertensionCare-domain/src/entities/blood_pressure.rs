use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::timestamp::parse_timestamp;

/// Time-of-day choices offered by the reading form
pub const TIME_OF_DAY_OPTIONS: [&str; 4] = ["Morning", "Afternoon", "Evening", "Night"];

/// Label used when a reading carries no category
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// A blood pressure reading as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BpReading {
    /// Unique identifier for the reading
    pub id: i64,

    #[serde(default)]
    pub user_id: Option<i64>,

    /// Systolic blood pressure (the higher number)
    pub systolic: i32,

    /// Diastolic blood pressure (the lower number)
    pub diastolic: i32,

    /// Optional pulse rate in beats per minute
    #[serde(default)]
    pub pulse: Option<i32>,

    /// When the reading was taken
    pub measurement_date: String,

    /// Morning, Afternoon, Evening or Night
    #[serde(default)]
    pub measurement_time: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,

    /// manual, csv or image
    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub is_abnormal: bool,

    #[serde(default)]
    pub abnormality_details: Option<String>,

    /// Clinical bucket assigned by the backend
    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,
}

impl BpReading {
    /// Parsed measurement timestamp
    pub fn measured_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.measurement_date)
    }

    /// Category label, `Unknown` when the backend left it empty
    pub fn category_label(&self) -> &str {
        self.category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(UNKNOWN_CATEGORY)
    }
}

/// Raw reading form input, every field as typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BpReadingForm {
    pub systolic: String,
    pub diastolic: String,
    pub pulse: String,
    /// `YYYY-MM-DDTHH:MM`
    pub measurement_date: String,
    pub measurement_time: String,
    pub notes: String,
    pub source: String,
}

impl BpReadingForm {
    /// Fresh form stamped with `now`, truncated to the minute
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            systolic: String::new(),
            diastolic: String::new(),
            pulse: String::new(),
            measurement_date: now.format("%Y-%m-%dT%H:%M").to_string(),
            measurement_time: "Morning".to_string(),
            notes: String::new(),
            source: "manual".to_string(),
        }
    }

    /// Clear the form after a successful submission
    pub fn reset(&mut self, now: NaiveDateTime) {
        *self = Self::new(now);
    }
}

/// Normalised payload for `POST /bp/readings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBpReadingRequest {
    pub systolic: i32,
    pub diastolic: i32,
    pub pulse: Option<i32>,
    pub measurement_date: String,
    pub measurement_time: String,
    pub notes: String,
    pub source: String,
}

/// Response of `POST /bp/readings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedReading {
    pub reading_id: i64,
    #[serde(default)]
    pub is_abnormal: bool,
    #[serde(default)]
    pub category: Option<String>,
}

/// Blood pressure category based on measurements
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BloodPressureCategory {
    /// Normal blood pressure (systolic < 120 and diastolic < 80)
    Normal,

    /// Elevated blood pressure (systolic 120-129 and diastolic < 80)
    Elevated,

    /// Stage 1 Hypertension (systolic 130-139 or diastolic 80-89)
    Hypertension1,

    /// Stage 2 Hypertension (systolic ≥ 140 or diastolic ≥ 90)
    Hypertension2,

    /// Hypertensive crisis (systolic ≥ 180 or diastolic ≥ 120)
    HypertensiveCrisis,
}

impl BloodPressureCategory {
    /// The label the backend uses for this category
    pub fn label(&self) -> &'static str {
        match self {
            BloodPressureCategory::Normal => "Normal",
            BloodPressureCategory::Elevated => "Elevated",
            BloodPressureCategory::Hypertension1 => "Hypertension Stage 1",
            BloodPressureCategory::Hypertension2 => "Hypertension Stage 2",
            BloodPressureCategory::HypertensiveCrisis => "Hypertensive Crisis",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Normal" => Some(BloodPressureCategory::Normal),
            "Elevated" => Some(BloodPressureCategory::Elevated),
            "Hypertension Stage 1" => Some(BloodPressureCategory::Hypertension1),
            "Hypertension Stage 2" => Some(BloodPressureCategory::Hypertension2),
            "Hypertensive Crisis" => Some(BloodPressureCategory::HypertensiveCrisis),
            _ => None,
        }
    }
}

impl std::fmt::Display for BloodPressureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Summary statistics computed locally from a set of readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingStats {
    pub avg_systolic: f64,
    pub avg_diastolic: f64,
    /// Average over readings that carry a pulse
    pub avg_pulse: Option<f64>,
    pub max_systolic: i32,
    pub max_diastolic: i32,
    pub min_systolic: i32,
    pub min_diastolic: i32,
    pub abnormal_count: usize,
    pub reading_count: usize,
    /// Category of the averaged values
    pub category: BloodPressureCategory,
}

/// Server-side summary returned by `GET /bp/analytics`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BpAnalytics {
    #[serde(default)]
    pub avg_systolic: Option<f64>,
    #[serde(default)]
    pub avg_diastolic: Option<f64>,
    #[serde(default)]
    pub max_systolic: Option<i32>,
    #[serde(default)]
    pub max_diastolic: Option<i32>,
    #[serde(default)]
    pub min_systolic: Option<i32>,
    #[serde(default)]
    pub min_diastolic: Option<i32>,
    #[serde(default)]
    pub reading_count: u32,
    #[serde(default)]
    pub abnormal_reading_count: u32,
    /// improving, worsening, stable or "insufficient data"
    #[serde(default)]
    pub trend_direction: Option<String>,
    #[serde(default)]
    pub trend_details: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Chart time window for reading series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    Week,
    #[default]
    Month,
    Year,
    All,
}

impl TimeRange {
    /// Window length in days, `None` for everything
    pub fn days(&self) -> Option<i64> {
        match self {
            TimeRange::Week => Some(7),
            TimeRange::Month => Some(30),
            TimeRange::Year => Some(365),
            TimeRange::All => None,
        }
    }
}

impl std::str::FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "week" => Ok(TimeRange::Week),
            "month" => Ok(TimeRange::Month),
            "year" => Ok(TimeRange::Year),
            "all" => Ok(TimeRange::All),
            other => Err(format!("Unknown time range: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_reading_deserializes_backend_shape() {
        let reading: BpReading = serde_json::from_str(
            r#"{
                "id": 4, "user_id": 1, "systolic": 135, "diastolic": 85, "pulse": null,
                "measurement_date": "2024-02-10T07:45:00", "measurement_time": "Morning",
                "notes": "", "source": "manual", "is_abnormal": true,
                "abnormality_details": "indicates Stage 1 Hypertension.",
                "category": "Hypertension Stage 1", "created_at": "2024-02-10T07:46:12"
            }"#,
        )
        .unwrap();

        assert_eq!(reading.systolic, 135);
        assert!(reading.pulse.is_none());
        assert!(reading.is_abnormal);
        assert_eq!(reading.category_label(), "Hypertension Stage 1");
        assert!(reading.measured_at().is_some());
    }

    #[test]
    fn test_missing_category_is_unknown() {
        let reading: BpReading = serde_json::from_str(
            r#"{"id": 1, "systolic": 120, "diastolic": 80, "measurement_date": "2024-02-10"}"#,
        )
        .unwrap();
        assert_eq!(reading.category_label(), UNKNOWN_CATEGORY);
    }

    #[test]
    fn test_category_labels_round_trip() {
        for category in [
            BloodPressureCategory::Normal,
            BloodPressureCategory::Elevated,
            BloodPressureCategory::Hypertension1,
            BloodPressureCategory::Hypertension2,
            BloodPressureCategory::HypertensiveCrisis,
        ] {
            assert_eq!(BloodPressureCategory::from_label(category.label()), Some(category));
        }
        assert_eq!(BloodPressureCategory::from_label("Mystery"), None);
    }

    #[test]
    fn test_form_defaults_and_reset() {
        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 15, 42)
            .unwrap();

        let mut form = BpReadingForm::new(now);
        assert_eq!(form.measurement_date, "2024-05-01T09:15");
        assert_eq!(form.measurement_time, "Morning");
        assert_eq!(form.source, "manual");

        form.systolic = "120".to_string();
        form.measurement_time = "Night".to_string();
        form.reset(now);
        assert!(form.systolic.is_empty());
        assert_eq!(form.measurement_time, "Morning");
    }

    #[test]
    fn test_time_range_days() {
        assert_eq!("week".parse::<TimeRange>().unwrap().days(), Some(7));
        assert_eq!(TimeRange::default().days(), Some(30));
        assert_eq!(TimeRange::Year.days(), Some(365));
        assert_eq!(TimeRange::All.days(), None);
        assert!("decade".parse::<TimeRange>().is_err());
    }
}
