use std::sync::Arc;

use tracing::{info, warn};

use hypertension_care_domain::entities::{PatientIntakeForm, PatientProfile, PredictionRecord};
use hypertension_care_domain::workflow::{PredictionState, PredictionWorkflow};

use super::PageError;
use crate::cancel::ViewScope;
use crate::error::ApiError;
use crate::services::{PredictionApi, ProfileApi, Services};

/// Advisory shown with results above the consultation threshold
pub const CONSULTATION_ADVICE: &str =
    "Your risk score is elevated. Please consult a healthcare professional about these results.";

/// Prediction form page
pub struct PredictionPage {
    scope: ViewScope,
    prediction: Arc<dyn PredictionApi>,
    profile: Arc<dyn ProfileApi>,
    workflow: PredictionWorkflow,
}

impl PredictionPage {
    pub fn new(services: &Services) -> Self {
        Self {
            scope: ViewScope::new(),
            prediction: Arc::clone(&services.prediction),
            profile: Arc::clone(&services.profile),
            workflow: PredictionWorkflow::new(),
        }
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub fn state(&self) -> &PredictionState {
        self.workflow.state()
    }

    pub fn workflow(&self) -> &PredictionWorkflow {
        &self.workflow
    }

    pub fn form_mut(&mut self) -> &mut PatientIntakeForm {
        self.workflow.form_mut()
    }

    /// Fetch the profile and previously saved intake data
    pub async fn load(&mut self) -> Result<(), ApiError> {
        let (profile, saved) = futures::join!(
            self.scope.run(self.profile.get_profile()),
            self.scope.run(self.prediction.patient_data()),
        );

        match (profile, saved) {
            (Ok(profile), Ok(saved)) => {
                self.workflow.on_loaded(profile, saved.as_ref());
                Ok(())
            }
            (Err(ApiError::Cancelled), _) | (_, Err(ApiError::Cancelled)) => Err(ApiError::Cancelled),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Prediction page could not load its data: {}", e);
                self.workflow.on_load_failed();
                Err(e)
            }
        }
    }

    /// Pick up a profile edited in the meantime
    pub fn profile_updated(&mut self, profile: PatientProfile) {
        self.workflow.on_profile_updated(profile);
    }

    /// Save the intake data, then ask for a prediction
    pub async fn submit(&mut self) -> Result<&PredictionRecord, PageError> {
        let payload = self.workflow.begin_submit()?;

        let prediction = Arc::clone(&self.prediction);
        let outcome = self
            .scope
            .run(async {
                prediction.save_patient_data(&payload).await?;
                prediction.predict(&payload).await
            })
            .await;

        match outcome {
            Ok(record) => {
                info!("Prediction ready: {} risk", record.risk_level);
                self.workflow.on_prediction(record)?;
            }
            Err(e) => {
                match e.missing_fields() {
                    Some(fields) => self.workflow.on_missing_fields(fields.to_vec())?,
                    None => self.workflow.on_submit_failed(e.user_message())?,
                }
                return Err(e.into());
            }
        }

        self.workflow
            .result()
            .ok_or_else(|| PageError::Api(ApiError::Rejected("No prediction available".to_string())))
    }

    /// Back from the result view to the form
    pub fn reset(&mut self) -> Result<(), PageError> {
        Ok(self.workflow.reset()?)
    }

    /// Advisory to show with the current result, if it calls for one
    pub fn advisory(&self) -> Option<&'static str> {
        self.workflow
            .result()
            .filter(|record| record.needs_consultation())
            .map(|_| CONSULTATION_ADVICE)
    }
}
