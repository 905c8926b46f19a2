//! Route table and the access guard in front of protected pages.

use serde::Serialize;

use crate::entities::session::UserSummary;

/// Every page of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Route {
    Home,
    Dashboard,
    Prediction,
    PredictionHistory,
    Profile,
    BpTracker,
    Login,
    Register,
}

impl Route {
    pub const ALL: [Route; 8] = [
        Route::Home,
        Route::Dashboard,
        Route::Prediction,
        Route::PredictionHistory,
        Route::Profile,
        Route::BpTracker,
        Route::Login,
        Route::Register,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Dashboard => "/dashboard",
            Route::Prediction => "/prediction",
            Route::PredictionHistory => "/prediction-history",
            Route::Profile => "/profile",
            Route::BpTracker => "/bp-tracker",
            Route::Login => "/login",
            Route::Register => "/register",
        }
    }

    /// Look up a route by path; a trailing slash is ignored
    pub fn from_path(path: &str) -> Option<Route> {
        let trimmed = path.trim();
        let normalized = if trimmed.len() > 1 {
            trimmed.trim_end_matches('/')
        } else {
            trimmed
        };
        Route::ALL.into_iter().find(|route| route.path() == normalized)
    }

    /// Whether the route requires a signed-in user
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login | Route::Register)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// The parts of the auth state the guard looks at
#[derive(Debug, Clone, Copy)]
pub struct AuthView<'a> {
    /// Session is still being restored from storage
    pub loading: bool,
    pub current_user: Option<&'a UserSummary>,
}

/// Outcome of guarding a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Auth state not resolved yet; show a loading indicator
    Loading,
    /// Navigate elsewhere instead
    Redirect(Route),
    /// Render the requested page
    Render(Route),
}

/// Decide what to show for `target` given the auth state
pub fn guard(auth: AuthView<'_>, target: Route) -> GuardDecision {
    if !target.is_protected() {
        return GuardDecision::Render(target);
    }

    if auth.loading {
        return GuardDecision::Loading;
    }

    match auth.current_user {
        Some(_) => GuardDecision::Render(target),
        None => GuardDecision::Redirect(Route::Login),
    }
}
