// HypertensionCare Data
// This crate persists the client session (bearer token and user summary) between runs

// Storage connection management
pub mod database;

// Key-value stores and the session repository
pub mod repository;

// Persisted record shapes
pub mod models;
