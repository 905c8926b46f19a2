// HypertensionCare Domain
// This crate contains the client-side rules of the HypertensionCare application:
// entities exchanged with the backend, local intake validation, derived analytics
// and the prediction workflow. Nothing in here performs I/O.

// Domain entities and value objects
pub mod entities;

// Pure services: validation, aggregation, table state, colours
pub mod services;

// Prediction form state machine
pub mod workflow;

// Route table and access guard
pub mod routing;

// Re-export the session storage layer for callers that only depend on the domain
#[cfg(feature = "with-data")]
pub use hypertension_care_data::repository as storage;
