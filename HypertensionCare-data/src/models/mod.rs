// Persisted record shapes
pub mod session;

pub use session::{StoredSession, StoredUser};
