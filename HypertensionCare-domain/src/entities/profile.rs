use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::intake::{parse_optional_float, parse_optional_int, IntakeError};

/// Gender values offered by the profile form
pub const GENDER_OPTIONS: [&str; 3] = ["Male", "Female", "Other"];

/// Patient profile as returned by `GET /user-profile`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    /// Age in years
    #[serde(default)]
    pub age: Option<u32>,

    /// Male, Female or Other
    #[serde(default)]
    pub gender: Option<String>,

    /// Weight in kilograms
    #[serde(default)]
    pub weight: Option<f64>,

    /// Height in centimetres
    #[serde(default)]
    pub height: Option<f64>,

    /// Body mass index, derived from height and weight
    #[serde(default)]
    pub bmi: Option<f64>,

    #[serde(default)]
    pub contact_email: Option<String>,

    #[serde(default)]
    pub emergency_contact: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,
}

impl PatientProfile {
    /// Labels of the fields a prediction still needs.
    ///
    /// A profile is complete with an age, a gender, and either a BMI or both height and
    /// weight. An absent profile is missing everything.
    pub fn missing_fields(profile: Option<&PatientProfile>) -> Vec<String> {
        let mut missing = Vec::new();

        let has_age = profile.and_then(|p| p.age).map_or(false, |age| age > 0);
        if !has_age {
            missing.push("age".to_string());
        }

        let has_gender = profile
            .and_then(|p| p.gender.as_deref())
            .map_or(false, |gender| !gender.trim().is_empty());
        if !has_gender {
            missing.push("gender".to_string());
        }

        let has_body_size = profile.map_or(false, |p| {
            positive(p.bmi) || (positive(p.height) && positive(p.weight))
        });
        if !has_body_size {
            missing.push("height and weight".to_string());
        }

        missing
    }

    /// BMI as stored, or computed from height and weight when the server left it empty
    pub fn effective_bmi(&self) -> Option<f64> {
        self.bmi
            .filter(|bmi| *bmi > 0.0)
            .or_else(|| calculate_bmi(self.height?, self.weight?))
    }
}

fn positive(value: Option<f64>) -> bool {
    value.map_or(false, |v| v > 0.0)
}

/// Body mass index from height in centimetres and weight in kilograms, rounded to two
/// decimals. Returns `None` unless both inputs are positive.
pub fn calculate_bmi(height_cm: f64, weight_kg: f64) -> Option<f64> {
    if !(height_cm > 0.0 && weight_kg > 0.0) || !height_cm.is_finite() || !weight_kg.is_finite() {
        return None;
    }

    let height_m = height_cm / 100.0;
    let bmi = weight_kg / (height_m * height_m);
    Some((bmi * 100.0).round() / 100.0)
}

/// BMI classification shown next to the computed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }
}

impl std::fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BmiCategory::Underweight => write!(f, "Underweight"),
            BmiCategory::Normal => write!(f, "Normal weight"),
            BmiCategory::Overweight => write!(f, "Overweight"),
            BmiCategory::Obese => write!(f, "Obese"),
        }
    }
}

/// Raw profile form input, every field as typed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub age: String,
    pub gender: String,
    pub height: String,
    pub weight: String,
    pub contact_email: String,
    pub emergency_contact: String,
}

impl ProfileForm {
    /// Pre-fill the form from a stored profile
    pub fn from_profile(profile: &PatientProfile) -> Self {
        Self {
            age: profile.age.map(|v| v.to_string()).unwrap_or_default(),
            gender: profile.gender.clone().unwrap_or_default(),
            height: profile.height.map(|v| v.to_string()).unwrap_or_default(),
            weight: profile.weight.map(|v| v.to_string()).unwrap_or_default(),
            contact_email: profile.contact_email.clone().unwrap_or_default(),
            emergency_contact: profile.emergency_contact.clone().unwrap_or_default(),
        }
    }

    /// Live BMI for the current height and weight text, `None` while either is missing
    pub fn bmi(&self) -> Option<f64> {
        let height = self.height.trim().parse::<f64>().ok()?;
        let weight = self.weight.trim().parse::<f64>().ok()?;
        calculate_bmi(height, weight)
    }

    /// Coerce the text fields into a validated payload
    pub fn to_payload(&self) -> Result<ProfilePayload, IntakeError> {
        let age = parse_optional_int("age", &self.age)?;
        let height = parse_optional_float("height", &self.height)?;
        let weight = parse_optional_float("weight", &self.weight)?;

        let payload = ProfilePayload {
            age,
            gender: non_empty(&self.gender),
            height,
            weight,
            bmi: self.bmi(),
            contact_email: non_empty(&self.contact_email),
            emergency_contact: non_empty(&self.emergency_contact),
        };

        payload.validate().map_err(IntakeError::from)?;
        Ok(payload)
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Body of `POST /user-profile` and `PUT /user-profile`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProfilePayload {
    #[validate(range(min = 0, max = 120, message = "Age must be between 0 and 120"))]
    pub age: Option<u32>,

    pub gender: Option<String>,

    /// Height in centimetres
    #[validate(range(min = 0.0, message = "Height cannot be negative"))]
    pub height: Option<f64>,

    /// Weight in kilograms
    #[validate(range(min = 0.0, message = "Weight cannot be negative"))]
    pub weight: Option<f64>,

    pub bmi: Option<f64>,

    #[validate(email(message = "Please enter a valid email address"))]
    pub contact_email: Option<String>,

    pub emergency_contact: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_bmi() {
        assert_eq!(calculate_bmi(170.0, 70.0), Some(24.22));
        assert_eq!(calculate_bmi(0.0, 70.0), None);
        assert_eq!(calculate_bmi(170.0, 0.0), None);
        assert_eq!(calculate_bmi(-170.0, 70.0), None);
        assert_eq!(calculate_bmi(f64::NAN, 70.0), None);
    }

    #[test]
    fn test_bmi_category_boundaries() {
        assert_eq!(BmiCategory::from_bmi(18.4), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(24.99), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
        assert_eq!(BmiCategory::Normal.to_string(), "Normal weight");
    }

    #[test]
    fn test_missing_fields_for_absent_profile() {
        let missing = PatientProfile::missing_fields(None);
        assert_eq!(missing, vec!["age", "gender", "height and weight"]);
    }

    #[test]
    fn test_bmi_satisfies_body_size_requirement() {
        let profile = PatientProfile {
            age: Some(52),
            gender: Some("Female".to_string()),
            bmi: Some(27.1),
            ..Default::default()
        };
        assert!(PatientProfile::missing_fields(Some(&profile)).is_empty());

        let only_height = PatientProfile {
            bmi: None,
            height: Some(165.0),
            ..profile
        };
        assert_eq!(
            PatientProfile::missing_fields(Some(&only_height)),
            vec!["height and weight"]
        );
    }

    #[test]
    fn test_effective_bmi_falls_back_to_computation() {
        let profile = PatientProfile {
            height: Some(170.0),
            weight: Some(70.0),
            ..Default::default()
        };
        assert_eq!(profile.effective_bmi(), Some(24.22));
    }

    #[test]
    fn test_profile_form_coercion() {
        let form = ProfileForm {
            age: "45".to_string(),
            gender: "Male".to_string(),
            height: "180".to_string(),
            weight: "81".to_string(),
            contact_email: String::new(),
            emergency_contact: " ".to_string(),
        };

        let payload = form.to_payload().unwrap();
        assert_eq!(payload.age, Some(45));
        assert_eq!(payload.height, Some(180.0));
        assert_eq!(payload.bmi, Some(25.0));
        assert!(payload.contact_email.is_none());
        assert!(payload.emergency_contact.is_none());
    }

    #[test]
    fn test_profile_form_rejects_bad_input() {
        let form = ProfileForm {
            age: "forty".to_string(),
            ..Default::default()
        };
        let err = form.to_payload().unwrap_err();
        assert_eq!(err.to_string(), "age must be a number");

        let form = ProfileForm {
            age: "130".to_string(),
            ..Default::default()
        };
        assert!(matches!(form.to_payload(), Err(IntakeError::Validation(_))));

        let form = ProfileForm {
            contact_email: "nobody".to_string(),
            ..Default::default()
        };
        let err = form.to_payload().unwrap_err();
        assert!(err.to_string().contains("valid email"));
    }

    #[test]
    fn test_form_round_trips_profile_values() {
        let profile = PatientProfile {
            age: Some(60),
            gender: Some("Other".to_string()),
            height: Some(172.5),
            ..Default::default()
        };
        let form = ProfileForm::from_profile(&profile);
        assert_eq!(form.age, "60");
        assert_eq!(form.height, "172.5");
        assert_eq!(form.weight, "");
        assert!(form.bmi().is_none());
    }
}
