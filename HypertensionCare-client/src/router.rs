//! Application shell: the services, the auth state and the guarded page factory.

use std::sync::Arc;

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::debug;

use hypertension_care_data::repository::SessionRepository;
use hypertension_care_domain::routing::{guard, GuardDecision, Route};

use crate::auth::AuthState;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::pages::{BpTrackerPage, DashboardPage, HistoryPage, PredictionPage, ProfilePage};
use crate::services::Services;

/// Why a page could not be opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("Still loading the session")]
    Loading,

    #[error("Please log in first (redirected to {0})")]
    Redirect(Route),
}

pub struct App {
    services: Services,
    auth: AuthState,
}

impl App {
    /// HTTP-backed application. The persisted session is read before returning, so
    /// the guard never sees the loading state afterwards.
    pub fn new(config: &ClientConfig, session: SessionRepository) -> Result<Self, ApiError> {
        let client = ApiClient::new(config, session.clone())?;
        let services = Services::http(client, config.analytics_mock_fallback);
        Ok(Self::with_services(services, session))
    }

    pub fn with_services(services: Services, session: SessionRepository) -> Self {
        let mut auth = AuthState::new(Arc::clone(&services.auth), session);
        auth.initialize();
        Self { services, auth }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    pub fn auth_mut(&mut self) -> &mut AuthState {
        &mut self.auth
    }

    /// Guard decision for `route` under the current auth state
    pub fn navigate(&self, route: Route) -> GuardDecision {
        let decision = guard(self.auth.view(), route);
        debug!("Navigate {} -> {:?}", route, decision);
        decision
    }

    /// The route to render, or why it cannot be
    pub fn open(&self, route: Route) -> Result<Route, NavigationError> {
        match self.navigate(route) {
            GuardDecision::Render(route) => Ok(route),
            GuardDecision::Redirect(target) => Err(NavigationError::Redirect(target)),
            GuardDecision::Loading => Err(NavigationError::Loading),
        }
    }

    pub fn dashboard(&self) -> Result<DashboardPage, NavigationError> {
        self.open(Route::Dashboard)?;
        Ok(DashboardPage::new(&self.services))
    }

    pub fn prediction(&self) -> Result<PredictionPage, NavigationError> {
        self.open(Route::Prediction)?;
        Ok(PredictionPage::new(&self.services))
    }

    pub fn history(&self) -> Result<HistoryPage, NavigationError> {
        self.open(Route::PredictionHistory)?;
        Ok(HistoryPage::new(&self.services))
    }

    pub fn profile(&self) -> Result<ProfilePage, NavigationError> {
        self.open(Route::Profile)?;
        Ok(ProfilePage::new(&self.services))
    }

    pub fn bp_tracker(&self, now: NaiveDateTime) -> Result<BpTrackerPage, NavigationError> {
        self.open(Route::BpTracker)?;
        Ok(BpTrackerPage::new(&self.services, now))
    }
}
