// Form workflows that span several backend calls
pub mod prediction;

pub use prediction::{PredictionState, PredictionWorkflow, WorkflowError, LOAD_ERROR_MESSAGE};
