use super::errors::StorageError;

/// String key-value storage, the persisted analogue of browser local storage.
///
/// Implementations synchronize internally and can be shared across tasks.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
