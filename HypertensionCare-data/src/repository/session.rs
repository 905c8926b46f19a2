use std::sync::Arc;

use tracing::warn;

use super::errors::StorageError;
use super::store::KeyValueStore;
use crate::models::session::{StoredSession, StoredUser};

/// Key holding the bearer token
pub const TOKEN_KEY: &str = "token";

/// Key holding the JSON user summary
pub const USER_KEY: &str = "user";

/// Reads and writes the persisted session
#[derive(Clone)]
pub struct SessionRepository {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for SessionRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRepository").finish_non_exhaustive()
    }
}

impl SessionRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Persist the token and user summary
    pub fn save(&self, session: &StoredSession) -> Result<(), StorageError> {
        let user = serde_json::to_string(&session.user)?;
        self.store.set(TOKEN_KEY, &session.token)?;
        self.store.set(USER_KEY, &user)?;
        Ok(())
    }

    /// The stored bearer token
    pub fn token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.store.get(TOKEN_KEY)?.filter(|token| !token.is_empty()))
    }

    /// The stored user summary. A value that does not parse is treated as absent.
    pub fn current_user(&self) -> Result<Option<StoredUser>, StorageError> {
        let Some(raw) = self.store.get(USER_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str::<StoredUser>(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!("Ignoring unreadable stored user: {}", e);
                Ok(None)
            }
        }
    }

    /// Token and user together, if both are present
    pub fn load(&self) -> Result<Option<StoredSession>, StorageError> {
        let token = self.token()?;
        let user = self.current_user()?;
        Ok(token.zip(user).map(|(token, user)| StoredSession { token, user }))
    }

    /// Whether a token is stored; its validity is not checked
    pub fn is_authenticated(&self) -> Result<bool, StorageError> {
        Ok(self.token()?.is_some())
    }

    /// Remove both keys
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::in_memory::InMemoryStore;
    use crate::repository::store::MockKeyValueStore;

    fn session() -> StoredSession {
        StoredSession {
            token: "abc".to_string(),
            user: StoredUser {
                id: 5,
                username: "ada".to_string(),
                role: Some("user".to_string()),
            },
        }
    }

    #[test]
    fn test_save_load_clear() {
        let store = InMemoryStore::new();
        let repo = SessionRepository::new(Arc::new(store.clone()));

        assert!(!repo.is_authenticated().unwrap());
        repo.save(&session()).unwrap();

        assert!(repo.is_authenticated().unwrap());
        assert_eq!(repo.load().unwrap(), Some(session()));
        assert_eq!(
            store.get(USER_KEY).unwrap().as_deref(),
            Some(r#"{"id":5,"username":"ada","role":"user"}"#)
        );

        repo.clear().unwrap();
        assert!(repo.load().unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_corrupt_user_is_absent() {
        let store = InMemoryStore::new();
        store.set(TOKEN_KEY, "abc").unwrap();
        store.set(USER_KEY, "{not json").unwrap();

        let repo = SessionRepository::new(Arc::new(store));
        assert!(repo.current_user().unwrap().is_none());
        assert!(repo.load().unwrap().is_none());
        // Authentication only looks at the token
        assert!(repo.is_authenticated().unwrap());
    }

    #[test]
    fn test_storage_errors_propagate() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .withf(|key| key.to_string() == TOKEN_KEY)
            .returning(|_| Err(StorageError::Lock("poisoned".to_string())));

        let repo = SessionRepository::new(Arc::new(store));
        let err = repo.token().unwrap_err();
        assert_eq!(err.to_string(), "Lock error: poisoned");
    }

    #[test]
    fn test_clear_removes_both_keys() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_remove()
            .withf(|key| key.to_string() == TOKEN_KEY)
            .times(1)
            .returning(|_| Ok(()));
        store
            .expect_remove()
            .withf(|key| key.to_string() == USER_KEY)
            .times(1)
            .returning(|_| Ok(()));

        SessionRepository::new(Arc::new(store)).clear().unwrap();
    }
}
