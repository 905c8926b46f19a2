//! State machine behind the prediction form.
//!
//! ```text
//! Loading ──► ProfileIncomplete ◄──────────────┐ (missing_fields from the server)
//!    │                                          │
//!    └──────► Ready ──► Submitting ──► Result ──┘
//!    │          ▲           │            │
//!    ▼          │           ▼            │ reset
//!  Error ───────┴─────── Error           ▼
//!                                      Ready
//! ```
//!
//! The completeness check is local and only saves a round trip; the backend stays
//! authoritative and can still push the form back into `ProfileIncomplete`.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::entities::prediction::{PatientIntakeForm, PatientIntakePayload, PredictionRecord};
use crate::entities::profile::PatientProfile;
use crate::services::intake::IntakeError;

/// Message shown when the profile or saved intake data cannot be fetched
pub const LOAD_ERROR_MESSAGE: &str = "Failed to load your data. Please try again later.";

/// Where the prediction form currently is
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionState {
    Loading,
    ProfileIncomplete { missing_fields: Vec<String> },
    Ready,
    Submitting,
    Result(PredictionRecord),
    Error(String),
}

impl PredictionState {
    fn name(&self) -> &'static str {
        match self {
            PredictionState::Loading => "loading",
            PredictionState::ProfileIncomplete { .. } => "profile-incomplete",
            PredictionState::Ready => "ready",
            PredictionState::Submitting => "submitting",
            PredictionState::Result(_) => "result",
            PredictionState::Error(_) => "error",
        }
    }
}

impl std::fmt::Display for PredictionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Prediction workflow errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    /// Profile lacks what a prediction needs
    #[error("Please complete your profile before requesting a prediction. Missing: {}", .0.join(", "))]
    ProfileIncomplete(Vec<String>),

    #[error("Your data is still loading")]
    StillLoading,

    #[error("A prediction request is already in progress")]
    AlreadySubmitting,

    /// Event does not apply in the current state
    #[error("Cannot {event} while {state}")]
    InvalidTransition { event: &'static str, state: String },

    #[error(transparent)]
    Intake(#[from] IntakeError),
}

/// Prediction form plus its state
#[derive(Debug, Clone)]
pub struct PredictionWorkflow {
    state: PredictionState,
    form: PatientIntakeForm,
    profile: Option<PatientProfile>,
    missing_fields: Vec<String>,
}

impl Default for PredictionWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionWorkflow {
    pub fn new() -> Self {
        Self {
            state: PredictionState::Loading,
            form: PatientIntakeForm::default(),
            profile: None,
            missing_fields: Vec::new(),
        }
    }

    pub fn state(&self) -> &PredictionState {
        &self.state
    }

    pub fn form(&self) -> &PatientIntakeForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut PatientIntakeForm {
        &mut self.form
    }

    pub fn profile(&self) -> Option<&PatientProfile> {
        self.profile.as_ref()
    }

    /// Fields the last completeness check (local or server) reported as missing
    pub fn missing_fields(&self) -> &[String] {
        &self.missing_fields
    }

    /// The profile and saved intake data have arrived
    pub fn on_loaded(&mut self, profile: Option<PatientProfile>, saved: Option<&Map<String, Value>>) {
        if let Some(saved) = saved {
            let merged = self.form.merge_saved(saved);
            debug!("Merged {} saved intake fields into the prediction form", merged);
        }

        self.missing_fields = PatientProfile::missing_fields(profile.as_ref());
        self.profile = profile;

        self.state = if self.missing_fields.is_empty() {
            PredictionState::Ready
        } else {
            PredictionState::ProfileIncomplete {
                missing_fields: self.missing_fields.clone(),
            }
        };
    }

    /// Loading failed. The form stays usable; a profile that was never checked does
    /// not block submission.
    pub fn on_load_failed(&mut self) {
        self.state = PredictionState::Error(LOAD_ERROR_MESSAGE.to_string());
    }

    /// The profile was edited elsewhere; re-run the completeness check
    pub fn on_profile_updated(&mut self, profile: PatientProfile) {
        if matches!(self.state, PredictionState::Submitting) {
            self.profile = Some(profile);
            return;
        }
        self.missing_fields = PatientProfile::missing_fields(Some(&profile));
        self.profile = Some(profile);
        self.state = if self.missing_fields.is_empty() {
            PredictionState::Ready
        } else {
            PredictionState::ProfileIncomplete {
                missing_fields: self.missing_fields.clone(),
            }
        };
    }

    /// Start a submission and hand back the payload to send.
    ///
    /// On a local validation failure the state is left untouched.
    pub fn begin_submit(&mut self) -> Result<PatientIntakePayload, WorkflowError> {
        match &self.state {
            PredictionState::Loading => return Err(WorkflowError::StillLoading),
            PredictionState::Submitting => return Err(WorkflowError::AlreadySubmitting),
            PredictionState::ProfileIncomplete { missing_fields } => {
                return Err(WorkflowError::ProfileIncomplete(missing_fields.clone()));
            }
            PredictionState::Ready | PredictionState::Result(_) | PredictionState::Error(_) => {}
        }

        if !self.missing_fields.is_empty() {
            return Err(WorkflowError::ProfileIncomplete(self.missing_fields.clone()));
        }

        let payload = self.form.to_payload(self.profile.as_ref())?;
        self.state = PredictionState::Submitting;
        Ok(payload)
    }

    fn expect_submitting(&self, event: &'static str) -> Result<(), WorkflowError> {
        if matches!(self.state, PredictionState::Submitting) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                event,
                state: self.state.to_string(),
            })
        }
    }

    /// The backend returned a prediction
    pub fn on_prediction(&mut self, record: PredictionRecord) -> Result<(), WorkflowError> {
        self.expect_submitting("accept a prediction")?;
        self.state = PredictionState::Result(record);
        Ok(())
    }

    /// The backend reported missing profile fields
    pub fn on_missing_fields(&mut self, missing_fields: Vec<String>) -> Result<(), WorkflowError> {
        self.expect_submitting("accept missing fields")?;
        self.missing_fields = missing_fields.clone();
        self.state = PredictionState::ProfileIncomplete { missing_fields };
        Ok(())
    }

    /// The submission failed for any other reason
    pub fn on_submit_failed(&mut self, message: impl Into<String>) -> Result<(), WorkflowError> {
        self.expect_submitting("accept a failure")?;
        self.state = PredictionState::Error(message.into());
        Ok(())
    }

    /// Leave the result view and return to the form
    pub fn reset(&mut self) -> Result<(), WorkflowError> {
        match self.state {
            PredictionState::Result(_) => {
                self.state = PredictionState::Ready;
                Ok(())
            }
            _ => Err(WorkflowError::InvalidTransition {
                event: "reset",
                state: self.state.to_string(),
            }),
        }
    }

    /// The prediction currently shown, if any
    pub fn result(&self) -> Option<&PredictionRecord> {
        match &self.state {
            PredictionState::Result(record) => Some(record),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete_profile() -> PatientProfile {
        PatientProfile {
            age: Some(55),
            gender: Some("Female".to_string()),
            height: Some(160.0),
            weight: Some(64.0),
            ..Default::default()
        }
    }

    fn record(score: f64) -> PredictionRecord {
        serde_json::from_value(json!({"prediction_score": score, "risk_level": "Moderate"})).unwrap()
    }

    #[test]
    fn test_complete_profile_becomes_ready() {
        let mut workflow = PredictionWorkflow::new();
        assert_eq!(workflow.state(), &PredictionState::Loading);

        let saved = json!({"sys_bp": 142, "current_smoker": true});
        workflow.on_loaded(Some(complete_profile()), saved.as_object());

        assert_eq!(workflow.state(), &PredictionState::Ready);
        assert_eq!(workflow.form().sys_bp, "142");
        assert!(workflow.form().current_smoker);
    }

    #[test]
    fn test_incomplete_profile_blocks_submission() {
        let mut workflow = PredictionWorkflow::new();
        let profile = PatientProfile {
            age: Some(40),
            ..Default::default()
        };
        workflow.on_loaded(Some(profile), None);

        assert_eq!(
            workflow.state(),
            &PredictionState::ProfileIncomplete {
                missing_fields: vec!["gender".to_string(), "height and weight".to_string()]
            }
        );

        let err = workflow.begin_submit().unwrap_err();
        assert!(matches!(err, WorkflowError::ProfileIncomplete(ref f) if f.len() == 2));
        assert!(err.to_string().contains("gender, height and weight"));
    }

    #[test]
    fn test_full_submission_cycle() {
        let mut workflow = PredictionWorkflow::new();
        workflow.on_loaded(Some(complete_profile()), None);

        let payload = workflow.begin_submit().unwrap();
        assert_eq!(payload.age, Some(55));
        assert_eq!(payload.bmi, Some(25.0));
        assert_eq!(workflow.state(), &PredictionState::Submitting);
        assert_eq!(workflow.begin_submit(), Err(WorkflowError::AlreadySubmitting));

        workflow.on_prediction(record(62.0)).unwrap();
        assert!(workflow.result().unwrap().needs_consultation());

        workflow.reset().unwrap();
        assert_eq!(workflow.state(), &PredictionState::Ready);
    }

    #[test]
    fn test_server_missing_fields_reenter_profile_incomplete() {
        let mut workflow = PredictionWorkflow::new();
        workflow.on_loaded(Some(complete_profile()), None);
        workflow.begin_submit().unwrap();

        workflow
            .on_missing_fields(vec!["age".to_string()])
            .unwrap();

        assert_eq!(
            workflow.state(),
            &PredictionState::ProfileIncomplete {
                missing_fields: vec!["age".to_string()]
            }
        );
        assert_eq!(workflow.missing_fields(), ["age".to_string()]);
        assert!(workflow.begin_submit().is_err());

        workflow.on_profile_updated(complete_profile());
        assert_eq!(workflow.state(), &PredictionState::Ready);
    }

    #[test]
    fn test_submit_failure_then_retry_from_error() {
        let mut workflow = PredictionWorkflow::new();
        workflow.on_loaded(Some(complete_profile()), None);
        workflow.begin_submit().unwrap();
        workflow.on_submit_failed("Model unavailable").unwrap();

        assert_eq!(workflow.state(), &PredictionState::Error("Model unavailable".to_string()));
        assert!(workflow.begin_submit().is_ok());
    }

    #[test]
    fn test_load_failure_still_allows_submission() {
        let mut workflow = PredictionWorkflow::new();
        workflow.on_load_failed();

        assert_eq!(workflow.state(), &PredictionState::Error(LOAD_ERROR_MESSAGE.to_string()));
        assert!(workflow.begin_submit().is_ok());
    }

    #[test]
    fn test_local_validation_error_keeps_state() {
        let mut workflow = PredictionWorkflow::new();
        workflow.on_loaded(Some(complete_profile()), None);
        workflow.form_mut().glucose = "lots".to_string();

        let err = workflow.begin_submit().unwrap_err();
        assert_eq!(err.to_string(), "glucose must be a number");
        assert_eq!(workflow.state(), &PredictionState::Ready);
    }

    #[test]
    fn test_late_events_are_rejected() {
        let mut workflow = PredictionWorkflow::new();
        workflow.on_loaded(Some(complete_profile()), None);

        let err = workflow.on_prediction(record(10.0)).unwrap_err();
        assert_eq!(err.to_string(), "Cannot accept a prediction while ready");
        assert!(workflow.reset().is_err());
        assert_eq!(workflow.begin_submit().map(|_| ()), Ok(()));
    }
}
