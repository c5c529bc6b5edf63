use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::models::User;

use super::{KeyValueStore, MemoryStore, StorageError};

const TOKEN_KEY: &str = "token";
const USER_KEY: &str = "user";

/// A persisted session: bearer token plus the last-known user record.
#[derive(Debug)]
pub struct Credentials {
    pub token: SecretString,
    pub user: User,
}

/// Typed access to the persisted session.
///
/// Token and user are stored as two independent entries. A missing token
/// means "logged out" regardless of any leftover user record. Every save or
/// clear is published on a watch channel carrying "token present".
#[derive(Clone)]
pub struct CredentialStore {
    inner: Arc<CredentialStoreInner>,
}

struct CredentialStoreInner {
    backend: Box<dyn KeyValueStore>,
    changes: watch::Sender<bool>,
}

impl CredentialStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        let has_token = matches!(backend.get(TOKEN_KEY), Ok(Some(_)));
        let (changes, _) = watch::channel(has_token);
        Self {
            inner: Arc::new(CredentialStoreInner {
                backend: Box::new(backend),
                changes,
            }),
        }
    }

    /// A store that lives only as long as the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Persist a freshly issued token and its user.
    ///
    /// # Errors
    ///
    /// Returns an error if either entry cannot be written.
    pub fn save(&self, token: &SecretString, user: &User) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(user)?;
        self.inner.backend.set(USER_KEY, &user_json)?;
        self.inner.backend.set(TOKEN_KEY, token.expose_secret())?;
        self.inner.changes.send_replace(true);
        debug!(user_id = %user.id, "Stored credentials");
        Ok(())
    }

    /// Read the stored session.
    ///
    /// Never fails. An unreadable token or user record is treated as absent
    /// and the store is cleared, so no token survives a corrupt record.
    #[must_use]
    pub fn read(&self) -> Option<Credentials> {
        let token = self.token()?;
        let raw_user = self.lookup(USER_KEY)?;

        match serde_json::from_str::<User>(&raw_user) {
            Ok(user) => Some(Credentials { token, user }),
            Err(e) => {
                warn!(error = %e, "Stored user record is corrupt, clearing credentials");
                self.clear();
                None
            }
        }
    }

    /// The stored token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.lookup(TOKEN_KEY).map(SecretString::from)
    }

    /// Read one entry. Corrupt storage is cleared and reads as absent.
    fn lookup(&self, key: &str) -> Option<String> {
        match self.inner.backend.get(key) {
            Ok(value) => value,
            Err(StorageError::Corrupt(e)) => {
                warn!(key, error = %e, "Credential storage is corrupt, clearing");
                self.clear();
                None
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to read credential entry");
                None
            }
        }
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    /// Remove both entries, whichever are present.
    pub fn clear(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.inner.backend.remove(key) {
                warn!(key, error = %e, "Failed to remove credential entry");
            }
        }
        self.inner.changes.send_replace(false);
        debug!("Cleared credentials");
    }

    /// Clear only if `token` is still the stored one.
    ///
    /// Returns whether anything was cleared. A rejection for a token that has
    /// since been replaced by a new login leaves the new session alone.
    pub fn clear_if_current(&self, token: &SecretString) -> bool {
        let current = self.token();
        let matches = current
            .as_ref()
            .is_some_and(|stored| stored.expose_secret() == token.expose_secret());
        if matches {
            self.clear();
        }
        matches
    }

    /// Observe token presence. The receiver sees a new value after every
    /// save and clear.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.changes.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use miraki_core::{Email, Role, UserId};

    use super::*;
    use crate::storage::FileStore;

    fn admin() -> User {
        User {
            id: UserId::new("u-1"),
            name: "Admin".to_string(),
            email: Email::parse("admin@miraki.com").unwrap(),
            role: Role::Admin,
            permissions: None,
            profile_image: None,
            created_at: None,
            last_login: None,
        }
    }

    fn token(raw: &str) -> SecretString {
        SecretString::from(raw.to_string())
    }

    #[test]
    fn test_save_then_read() {
        let store = CredentialStore::in_memory();
        store.save(&token("t-1"), &admin()).unwrap();

        let creds = store.read().unwrap();
        assert_eq!(creds.token.expose_secret(), "t-1");
        assert_eq!(creds.user, admin());
    }

    #[test]
    fn test_user_without_token_reads_as_logged_out() {
        let backend = MemoryStore::new();
        backend
            .set(USER_KEY, &serde_json::to_string(&admin()).unwrap())
            .unwrap();
        let store = CredentialStore::new(backend);

        assert!(store.read().is_none());
        assert!(!store.has_token());
    }

    #[test]
    fn test_corrupt_user_clears_token() {
        let backend = MemoryStore::new();
        backend.set(TOKEN_KEY, "t-1").unwrap();
        backend.set(USER_KEY, "{\"name\": ").unwrap();
        let store = CredentialStore::new(backend);

        assert!(store.read().is_none());
        assert!(store.token().is_none());
    }

    #[test]
    fn test_corrupt_file_reads_as_logged_out_and_is_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{\"token\": ").unwrap();
        let store = CredentialStore::new(FileStore::new(&path));
        let mut rx = store.subscribe();

        assert!(store.read().is_none());
        assert!(!*rx.borrow_and_update());

        // The corrupt file was replaced, so the backend reads cleanly again.
        assert_eq!(FileStore::new(&path).get(TOKEN_KEY).unwrap(), None);
        store.save(&token("t-2"), &admin()).unwrap();
        assert_eq!(store.read().unwrap().token.expose_secret(), "t-2");
    }

    #[test]
    fn test_clear_removes_both_even_if_one_missing() {
        let backend = MemoryStore::new();
        backend.set(TOKEN_KEY, "t-1").unwrap();
        let store = CredentialStore::new(backend);

        store.clear();

        assert!(store.token().is_none());
        assert!(store.read().is_none());
    }

    #[test]
    fn test_clear_if_current_ignores_replaced_token() {
        let store = CredentialStore::in_memory();
        store.save(&token("new"), &admin()).unwrap();

        assert!(!store.clear_if_current(&token("old")));
        assert!(store.has_token());

        assert!(store.clear_if_current(&token("new")));
        assert!(!store.has_token());
    }

    #[tokio::test]
    async fn test_changes_are_published() {
        let store = CredentialStore::in_memory();
        let mut rx = store.subscribe();
        assert!(!*rx.borrow());

        store.save(&token("t-1"), &admin()).unwrap();
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());

        store.clear();
        rx.changed().await.unwrap();
        assert!(!*rx.borrow());
    }
}
