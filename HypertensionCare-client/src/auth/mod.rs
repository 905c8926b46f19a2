// Authentication state and audit logging
pub mod logging;
mod state;

pub use state::{AuthState, LOGIN_FAILED, REGISTRATION_FAILED};
