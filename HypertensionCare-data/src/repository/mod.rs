// Repository module structure
pub mod errors;
mod in_memory;
mod session;
#[cfg(feature = "sqlite")]
mod sqlite;
mod store;

// Re-export commonly used types
pub use errors::StorageError;
pub use in_memory::InMemoryStore;
pub use session::{SessionRepository, TOKEN_KEY, USER_KEY};
#[cfg(feature = "sqlite")]
pub use sqlite::{open_session_store, SqliteStore};
pub use store::KeyValueStore;

// Store mocks for this crate's tests and for dependents enabling the mock feature
#[cfg(any(test, feature = "mock"))]
pub use store::MockKeyValueStore;
