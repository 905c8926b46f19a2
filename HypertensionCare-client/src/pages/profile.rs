use std::sync::Arc;

use tracing::info;

use hypertension_care_domain::entities::{BmiCategory, PatientProfile, ProfileForm};

use crate::cancel::ViewScope;
use crate::error::ApiError;
use crate::services::{ProfileApi, Services};

/// Profile page: one form that creates the profile the first time and updates it after
pub struct ProfilePage {
    scope: ViewScope,
    api: Arc<dyn ProfileApi>,
    profile: Option<PatientProfile>,
    form: ProfileForm,
    error: Option<String>,
    notice: Option<String>,
}

impl ProfilePage {
    pub fn new(services: &Services) -> Self {
        Self {
            scope: ViewScope::new(),
            api: Arc::clone(&services.profile),
            profile: None,
            form: ProfileForm::default(),
            error: None,
            notice: None,
        }
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub fn profile(&self) -> Option<&PatientProfile> {
        self.profile.as_ref()
    }

    pub fn form(&self) -> &ProfileForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ProfileForm {
        &mut self.form
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Live BMI and its category for the current form values
    pub fn bmi(&self) -> Option<(f64, BmiCategory)> {
        self.form.bmi().map(|bmi| (bmi, BmiCategory::from_bmi(bmi)))
    }

    /// Fetch the stored profile and pre-fill the form. A user without a profile
    /// gets an empty form.
    pub async fn load(&mut self) -> Result<(), ApiError> {
        self.error = None;
        match self.scope.run(self.api.get_profile()).await {
            Ok(profile) => {
                self.form = profile.as_ref().map(ProfileForm::from_profile).unwrap_or_default();
                self.profile = profile;
                Ok(())
            }
            Err(e) => {
                if !e.is_cancelled() {
                    self.error = Some(e.user_message());
                }
                Err(e)
            }
        }
    }

    /// Validate the form, then create or update
    pub async fn save(&mut self) -> Result<&PatientProfile, ApiError> {
        self.error = None;
        self.notice = None;

        let payload = self.form.to_payload().map_err(|e| {
            self.error = Some(e.to_string());
            ApiError::from(e)
        })?;

        let exists = self.profile.is_some();
        let result = if exists {
            self.scope.run(self.api.update_profile(&payload)).await
        } else {
            self.scope.run(self.api.create_profile(&payload)).await
        };

        let saved = match result {
            Ok(saved) => saved,
            Err(e) => {
                if !e.is_cancelled() {
                    self.error = Some(e.user_message());
                }
                return Err(e);
            }
        };

        info!("Profile {}", if exists { "updated" } else { "created" });
        let notice = if exists {
            "Profile updated successfully"
        } else {
            "Profile created successfully"
        };
        self.notice = Some(notice.to_string());
        self.form = ProfileForm::from_profile(&saved);
        Ok(&*self.profile.insert(saved))
    }

    pub async fn delete(&mut self) -> Result<(), ApiError> {
        self.error = None;
        match self.scope.run(self.api.delete_profile()).await {
            Ok(message) => {
                info!("Profile deleted");
                self.profile = None;
                self.form = ProfileForm::default();
                self.notice = Some(message.unwrap_or_else(|| "Profile deleted".to_string()));
                Ok(())
            }
            Err(e) => {
                if !e.is_cancelled() {
                    self.error = Some(e.user_message());
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::MockAuthApi;
    use crate::services::blood_pressure::MockBloodPressureApi;
    use crate::services::prediction::MockPredictionApi;
    use crate::services::profile::MockProfileApi;

    fn page(api: MockProfileApi) -> ProfilePage {
        ProfilePage::new(&Services {
            auth: Arc::new(MockAuthApi::new()),
            prediction: Arc::new(MockPredictionApi::new()),
            blood_pressure: Arc::new(MockBloodPressureApi::new()),
            profile: Arc::new(api),
        })
    }

    fn stored() -> PatientProfile {
        PatientProfile {
            age: Some(58),
            gender: Some("Female".to_string()),
            height: Some(160.0),
            weight: Some(64.0),
            bmi: Some(25.0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_first_save_creates_profile() {
        let mut api = MockProfileApi::new();
        api.expect_get_profile().returning(|| Ok(None));
        api.expect_update_profile().never();
        api.expect_create_profile()
            .withf(|payload| payload.age == Some(44) && payload.bmi == Some(24.22))
            .times(1)
            .returning(|payload| {
                Ok(PatientProfile {
                    age: payload.age,
                    gender: payload.gender.clone(),
                    height: payload.height,
                    weight: payload.weight,
                    bmi: payload.bmi,
                    ..Default::default()
                })
            });

        let mut page = page(api);
        page.load().await.unwrap();
        assert!(page.profile().is_none());
        assert_eq!(page.form(), &ProfileForm::default());

        page.form_mut().age = "44".to_string();
        page.form_mut().gender = "Male".to_string();
        page.form_mut().height = "170".to_string();
        page.form_mut().weight = "70".to_string();
        assert_eq!(page.bmi(), Some((24.22, BmiCategory::Normal)));

        let saved = page.save().await.unwrap();
        assert_eq!(saved.age, Some(44));
        assert_eq!(page.notice(), Some("Profile created successfully"));
    }

    #[tokio::test]
    async fn test_existing_profile_is_updated() {
        let mut api = MockProfileApi::new();
        api.expect_get_profile().returning(|| Ok(Some(stored())));
        api.expect_create_profile().never();
        api.expect_update_profile()
            .withf(|payload| payload.weight == Some(60.0))
            .times(1)
            .returning(|_| Ok(PatientProfile { weight: Some(60.0), ..stored() }));

        let mut page = page(api);
        page.load().await.unwrap();
        assert_eq!(page.form().age, "58");

        page.form_mut().weight = "60".to_string();
        page.save().await.unwrap();
        assert_eq!(page.profile().and_then(|p| p.weight), Some(60.0));
        assert_eq!(page.notice(), Some("Profile updated successfully"));
    }

    #[tokio::test]
    async fn test_invalid_form_is_rejected_locally() {
        let mut page = page(MockProfileApi::new());
        page.form_mut().contact_email = "not-an-email".to_string();

        assert!(matches!(page.save().await, Err(ApiError::Validation(_))));
        assert!(page.error().unwrap().contains("valid email"));
    }

    #[tokio::test]
    async fn test_delete_clears_form() {
        let mut api = MockProfileApi::new();
        api.expect_get_profile().returning(|| Ok(Some(stored())));
        api.expect_delete_profile()
            .returning(|| Ok(Some("Profile deleted successfully".to_string())));

        let mut page = page(api);
        page.load().await.unwrap();
        page.delete().await.unwrap();

        assert!(page.profile().is_none());
        assert!(page.form().age.is_empty());
        assert_eq!(page.notice(), Some("Profile deleted successfully"));
    }
}
