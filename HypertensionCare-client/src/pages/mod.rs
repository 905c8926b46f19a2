// Page controllers: each owns a cancellation scope, fetches through the services and
// keeps the view state the presentation helpers work from.
pub mod bp_tracker;
pub mod dashboard;
pub mod history;
pub mod prediction;
pub mod profile;

use thiserror::Error;

use hypertension_care_domain::workflow::WorkflowError;

use crate::error::ApiError;

pub use bp_tracker::BpTrackerPage;
pub use dashboard::DashboardPage;
pub use history::HistoryPage;
pub use prediction::PredictionPage;
pub use profile::ProfilePage;

/// Failures of a page action
#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl PageError {
    /// Text to show the user
    pub fn user_message(&self) -> String {
        match self {
            PageError::Api(e) => e.user_message(),
            PageError::Workflow(e) => e.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PageError::Api(e) if e.is_cancelled())
    }
}
