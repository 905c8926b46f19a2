use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::profile::PatientProfile;
use super::timestamp::parse_timestamp;
use crate::services::intake::{parse_optional_float, parse_optional_int, IntakeError};

/// Score above which the result recommends seeing a professional
pub const CONSULTATION_THRESHOLD: f64 = 50.0;

/// Risk bucket assigned to a prediction score by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::VeryHigh => "Very High",
        }
    }

    /// Parse a backend label; unknown labels yield `None`
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Low" => Some(RiskLevel::Low),
            "Moderate" => Some(RiskLevel::Moderate),
            "High" => Some(RiskLevel::High),
            "Very High" => Some(RiskLevel::VeryHigh),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A prediction returned by `POST /prediction/predict` or found in the history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Risk score in percent, 0 to 100
    pub prediction_score: f64,

    /// Low, Moderate, High or Very High; kept as text so unknown labels survive
    pub risk_level: String,

    /// Risk factors the backend identified, most severe first
    #[serde(default, alias = "risk_factors")]
    pub key_factors: Vec<String>,

    #[serde(default)]
    pub recommendations: Vec<String>,

    #[serde(default)]
    pub prediction_date: Option<String>,

    /// Feature name to importance; values may be numbers or numeric strings
    #[serde(default)]
    pub feature_importances: Option<IndexMap<String, Value>>,
}

impl PredictionRecord {
    pub fn risk(&self) -> Option<RiskLevel> {
        RiskLevel::from_label(&self.risk_level)
    }

    pub fn predicted_at(&self) -> Option<NaiveDateTime> {
        self.prediction_date.as_deref().and_then(parse_timestamp)
    }

    /// Whether the result should advise consulting a healthcare professional
    pub fn needs_consultation(&self) -> bool {
        self.prediction_score > CONSULTATION_THRESHOLD
    }
}

/// `prediction_history` arrives either as a single record or as a list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PredictionHistoryPayload {
    Many(Vec<PredictionRecord>),
    One(PredictionRecord),
}

impl PredictionHistoryPayload {
    pub fn into_records(self) -> Vec<PredictionRecord> {
        match self {
            PredictionHistoryPayload::Many(records) => records,
            PredictionHistoryPayload::One(record) => vec![record],
        }
    }
}

/// Raw prediction intake form.
///
/// Numeric fields hold the text as typed; an empty string means "not provided".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientIntakeForm {
    pub current_smoker: bool,
    pub cigs_per_day: String,
    pub bp_meds: bool,
    pub diabetes: bool,
    pub total_chol: String,
    pub sys_bp: String,
    pub dia_bp: String,
    pub heart_rate: String,
    pub glucose: String,
    pub diet_description: String,
    pub medical_history: String,
    /// Low, Moderate or High
    pub physical_activity_level: String,
    pub kidney_disease: bool,
    pub heart_disease: bool,
    pub family_history_htn: bool,
    /// None, Light, Moderate or Heavy
    pub alcohol_consumption: String,
    /// Low, Moderate or High
    pub salt_intake: String,
    /// Low, Moderate or High
    pub stress_level: String,
    pub sleep_hours: String,
}

impl Default for PatientIntakeForm {
    fn default() -> Self {
        Self {
            current_smoker: false,
            cigs_per_day: "0".to_string(),
            bp_meds: false,
            diabetes: false,
            total_chol: String::new(),
            sys_bp: String::new(),
            dia_bp: String::new(),
            heart_rate: String::new(),
            glucose: String::new(),
            diet_description: String::new(),
            medical_history: String::new(),
            physical_activity_level: String::new(),
            kidney_disease: false,
            heart_disease: false,
            family_history_htn: false,
            alcohol_consumption: String::new(),
            salt_intake: String::new(),
            stress_level: String::new(),
            sleep_hours: String::new(),
        }
    }
}

impl PatientIntakeForm {
    /// Overlay previously saved patient data onto the form.
    ///
    /// Only fields the form knows about and the server returned non-null are copied.
    /// Returns the number of fields that were filled.
    pub fn merge_saved(&mut self, saved: &Map<String, Value>) -> usize {
        let mut merged = 0;

        for (key, value) in saved {
            if value.is_null() {
                continue;
            }
            let applied = match self.flag_mut(key) {
                Some(flag) => match value {
                    Value::Bool(b) => {
                        *flag = *b;
                        true
                    }
                    Value::Number(n) => {
                        *flag = n.as_f64().map_or(false, |v| v != 0.0);
                        true
                    }
                    _ => false,
                },
                None => match self.text_mut(key) {
                    Some(text) => match value {
                        Value::String(s) => {
                            *text = s.clone();
                            true
                        }
                        Value::Number(n) => {
                            *text = n.to_string();
                            true
                        }
                        _ => false,
                    },
                    None => false,
                },
            };
            if applied {
                merged += 1;
            }
        }

        merged
    }

    fn flag_mut(&mut self, key: &str) -> Option<&mut bool> {
        match key {
            "current_smoker" => Some(&mut self.current_smoker),
            "bp_meds" => Some(&mut self.bp_meds),
            "diabetes" => Some(&mut self.diabetes),
            "kidney_disease" => Some(&mut self.kidney_disease),
            "heart_disease" => Some(&mut self.heart_disease),
            "family_history_htn" => Some(&mut self.family_history_htn),
            _ => None,
        }
    }

    fn text_mut(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "cigs_per_day" => Some(&mut self.cigs_per_day),
            "total_chol" => Some(&mut self.total_chol),
            "sys_bp" => Some(&mut self.sys_bp),
            "dia_bp" => Some(&mut self.dia_bp),
            "heart_rate" => Some(&mut self.heart_rate),
            "glucose" => Some(&mut self.glucose),
            "diet_description" => Some(&mut self.diet_description),
            "medical_history" => Some(&mut self.medical_history),
            "physical_activity_level" => Some(&mut self.physical_activity_level),
            "alcohol_consumption" => Some(&mut self.alcohol_consumption),
            "salt_intake" => Some(&mut self.salt_intake),
            "stress_level" => Some(&mut self.stress_level),
            "sleep_hours" => Some(&mut self.sleep_hours),
            _ => None,
        }
    }

    /// Coerce the form into the payload for `POST /prediction/patient-data`.
    ///
    /// Age, gender and BMI come from the profile; the backend rejects intake data
    /// without age and gender.
    pub fn to_payload(&self, profile: Option<&PatientProfile>) -> Result<PatientIntakePayload, IntakeError> {
        Ok(PatientIntakePayload {
            age: profile.and_then(|p| p.age),
            gender: profile.and_then(|p| p.gender.clone()),
            bmi: profile.and_then(PatientProfile::effective_bmi),
            current_smoker: self.current_smoker,
            cigs_per_day: parse_optional_int("cigs_per_day", &self.cigs_per_day)?,
            bp_meds: self.bp_meds,
            diabetes: self.diabetes,
            total_chol: parse_optional_float("total_chol", &self.total_chol)?,
            sys_bp: parse_optional_float("sys_bp", &self.sys_bp)?,
            dia_bp: parse_optional_float("dia_bp", &self.dia_bp)?,
            heart_rate: parse_optional_int("heart_rate", &self.heart_rate)?,
            glucose: parse_optional_float("glucose", &self.glucose)?,
            diet_description: optional_text(&self.diet_description),
            medical_history: optional_text(&self.medical_history),
            physical_activity_level: optional_text(&self.physical_activity_level),
            kidney_disease: self.kidney_disease,
            heart_disease: self.heart_disease,
            family_history_htn: self.family_history_htn,
            alcohol_consumption: optional_text(&self.alcohol_consumption),
            salt_intake: optional_text(&self.salt_intake),
            stress_level: optional_text(&self.stress_level),
            sleep_hours: parse_optional_float("sleep_hours", &self.sleep_hours)?,
        })
    }
}

fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Normalised body for `POST /prediction/patient-data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientIntakePayload {
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub bmi: Option<f64>,
    pub current_smoker: bool,
    pub cigs_per_day: Option<u32>,
    pub bp_meds: bool,
    pub diabetes: bool,
    pub total_chol: Option<f64>,
    pub sys_bp: Option<f64>,
    pub dia_bp: Option<f64>,
    pub heart_rate: Option<u32>,
    pub glucose: Option<f64>,
    pub diet_description: Option<String>,
    pub medical_history: Option<String>,
    pub physical_activity_level: Option<String>,
    pub kidney_disease: bool,
    pub heart_disease: bool,
    pub family_history_htn: bool,
    pub alcohol_consumption: Option<String>,
    pub salt_intake: Option<String>,
    pub stress_level: Option<String>,
    pub sleep_hours: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_risk_level_labels() {
        assert_eq!(RiskLevel::from_label("Very High"), Some(RiskLevel::VeryHigh));
        assert_eq!(RiskLevel::VeryHigh.to_string(), "Very High");
        assert_eq!(RiskLevel::from_label("Extreme"), None);
    }

    #[test]
    fn test_history_accepts_single_record_or_list() {
        let single: PredictionHistoryPayload = serde_json::from_value(json!({
            "prediction_score": 42,
            "prediction_date": "2024-01-02 10:00:00",
            "risk_level": "Moderate",
            "key_factors": ["Diabetes"]
        }))
        .unwrap();
        assert_eq!(single.into_records().len(), 1);

        let many: PredictionHistoryPayload = serde_json::from_value(json!([
            {"prediction_score": 12.5, "risk_level": "Low", "risk_factors": ["Age over 40"]},
            {"prediction_score": 81, "risk_level": "Very High"}
        ]))
        .unwrap();
        let records = many.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key_factors, vec!["Age over 40"]);
        assert!(records[1].key_factors.is_empty());
    }

    #[test]
    fn test_needs_consultation_above_fifty() {
        let mut record: PredictionRecord =
            serde_json::from_value(json!({"prediction_score": 50, "risk_level": "High"})).unwrap();
        assert!(!record.needs_consultation());

        record.prediction_score = 50.5;
        assert!(record.needs_consultation());
    }

    #[test]
    fn test_merge_saved_only_copies_known_non_null_fields() {
        let mut form = PatientIntakeForm::default();
        let saved = json!({
            "current_smoker": true,
            "cigs_per_day": 10,
            "total_chol": 212.5,
            "glucose": null,
            "stress_level": "High",
            "prediction_score": 33,
            "age": 50
        });

        let merged = form.merge_saved(saved.as_object().unwrap());
        assert_eq!(merged, 4);
        assert!(form.current_smoker);
        assert_eq!(form.cigs_per_day, "10");
        assert_eq!(form.total_chol, "212.5");
        assert_eq!(form.glucose, "");
        assert_eq!(form.stress_level, "High");
    }

    #[test]
    fn test_payload_coerces_empty_numbers_to_null() {
        let form = PatientIntakeForm {
            sys_bp: "138".to_string(),
            sleep_hours: " ".to_string(),
            ..Default::default()
        };
        let profile = PatientProfile {
            age: Some(48),
            gender: Some("Male".to_string()),
            height: Some(170.0),
            weight: Some(70.0),
            ..Default::default()
        };

        let payload = form.to_payload(Some(&profile)).unwrap();
        assert_eq!(payload.age, Some(48));
        assert_eq!(payload.bmi, Some(24.22));
        assert_eq!(payload.cigs_per_day, Some(0));
        assert_eq!(payload.sys_bp, Some(138.0));
        assert_eq!(payload.sleep_hours, None);
        assert_eq!(payload.stress_level, None);
    }

    #[test]
    fn test_payload_names_non_numeric_field() {
        let form = PatientIntakeForm {
            glucose: "high".to_string(),
            ..Default::default()
        };
        let err = form.to_payload(None).unwrap_err();
        assert_eq!(
            err,
            IntakeError::NotNumeric {
                field: "glucose".to_string()
            }
        );
    }
}
