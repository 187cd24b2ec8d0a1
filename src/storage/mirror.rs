//! Typed view over the key-value store
//!
//! The mirror owns the three persisted keys and their JSON encoding. Reads are
//! forgiving: a missing or corrupt value is logged and treated as absent.
//! Writes report their failures to the caller.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::models::{InsuranceDocument, User};
use crate::storage::store::{KeyValueStore, StorageError};

pub const USER_KEY: &str = "user";
pub const TOKEN_KEY: &str = "token";
pub const DOCUMENTS_KEY: &str = "documents";

#[derive(Clone)]
pub struct PersistenceMirror {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for PersistenceMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceMirror").finish_non_exhaustive()
    }
}

impl PersistenceMirror {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn load_user(&self) -> Option<User> {
        self.read_json(USER_KEY)
    }

    /// # Errors
    ///
    /// Returns an error if the user cannot be encoded or written
    pub fn save_user(&self, user: &User) -> Result<(), StorageError> {
        self.write_json(USER_KEY, user)
    }

    #[must_use]
    pub fn load_token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                log::warn!("Failed to read persisted token: {e}");
                None
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if the token cannot be written
    pub fn save_token(&self, token: &str) -> Result<(), StorageError> {
        self.store.set(TOKEN_KEY, token)
    }

    /// # Errors
    ///
    /// Returns an error if the token cannot be removed
    pub fn clear_token(&self) -> Result<(), StorageError> {
        self.store.remove(TOKEN_KEY)
    }

    /// Every stored document across all users of this installation
    #[must_use]
    pub fn load_documents(&self) -> Vec<InsuranceDocument> {
        self.read_json(DOCUMENTS_KEY).unwrap_or_default()
    }

    /// Replace the full stored document collection
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be encoded or written
    pub fn save_documents(&self, documents: &[InsuranceDocument]) -> Result<(), StorageError> {
        self.write_json(DOCUMENTS_KEY, documents)
    }

    /// Remove user, token and the whole document collection
    ///
    /// # Errors
    ///
    /// Returns the first removal failure; remaining keys are still attempted
    pub fn clear_session(&self) -> Result<(), StorageError> {
        let mut first_error = None;
        for key in [USER_KEY, TOKEN_KEY, DOCUMENTS_KEY] {
            if let Err(e) = self.store.remove(key) {
                log::warn!("Failed to remove persisted '{key}': {e}");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Failed to read persisted '{key}': {e}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!("Error parsing persisted '{key}': {e}");
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(value).map_err(|source| StorageError::Serialization {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, &encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn mirror_with_store() -> (PersistenceMirror, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (PersistenceMirror::new(store.clone()), store)
    }

    #[test]
    fn test_user_round_trip() {
        let (mirror, _) = mirror_with_store();
        assert!(mirror.load_user().is_none());

        let user = User::local("nour@example.com", "nour");
        mirror.save_user(&user).unwrap();
        assert_eq!(mirror.load_user(), Some(user));
    }

    #[test]
    fn test_corrupt_documents_read_as_empty() {
        let (mirror, store) = mirror_with_store();
        store.set(DOCUMENTS_KEY, "not json").unwrap();
        assert!(mirror.load_documents().is_empty());
    }

    #[test]
    fn test_empty_token_is_absent() {
        let (mirror, _) = mirror_with_store();
        mirror.save_token("").unwrap();
        assert!(mirror.load_token().is_none());

        mirror.save_token("bearer-1").unwrap();
        assert_eq!(mirror.load_token().as_deref(), Some("bearer-1"));
    }

    #[test]
    fn test_clear_session_removes_all_keys() {
        let (mirror, store) = mirror_with_store();
        mirror.save_user(&User::local("a@b.c", "a")).unwrap();
        mirror.save_token("t").unwrap();
        mirror.save_documents(&[]).unwrap();

        mirror.clear_session().unwrap();

        for key in [USER_KEY, TOKEN_KEY, DOCUMENTS_KEY] {
            assert_eq!(store.get(key).unwrap(), None);
        }
    }
}
