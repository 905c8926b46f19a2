// HypertensionCare Client
//
// Talks to the HypertensionCare backend on behalf of a signed-in user and drives the
// page controllers the command-line front end renders.

// Configuration from the environment
pub mod config;

// Error normalization for every backend call
pub mod error;

// HTTP transport with bearer-token injection
pub mod http;

// Request cancellation scopes
pub mod cancel;

// Sign-in state and auth event logging
pub mod auth;

// Service wrappers, one per backend area
pub mod services;

// Page controllers
pub mod pages;

// Route guard and page factory
pub mod router;

// Command-line front end
pub mod cli;

// Re-export the types most callers start from
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::ApiClient;
pub use router::{App, NavigationError};
