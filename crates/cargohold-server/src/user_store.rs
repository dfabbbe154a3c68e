//! Pluggable user store and credential hashing.
//!
//! The core never hashes credentials or owns a user table directly; it
//! depends on this trait so a deployment can substitute a stronger hasher or
//! a real database-backed store without touching session or dispatch logic.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use sha2::{Digest, Sha256};

/// A stored user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Opaque user id, stable for the account's lifetime.
    pub user_id: String,
    /// Username as originally given (case preserved for display).
    pub username: String,
    /// Email as given at account creation.
    pub email: String,
    /// Salted credential verifier, opaque to callers.
    credential: String,
}

/// Errors from user store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserStoreError {
    /// The requested username is already taken (case-insensitive).
    #[error("username already exists")]
    UsernameTaken,
    /// No account exists for the given username.
    #[error("no such user")]
    NotFound,
    /// The supplied password did not match the stored credential.
    #[error("invalid credentials")]
    InvalidCredentials,
}

/// Hashes and verifies passwords. The default hasher is a salted SHA-256
/// verifier suitable for development; production deployments are expected
/// to substitute argon2 or bcrypt behind this same trait.
pub trait CredentialHasher: Send + Sync + 'static {
    /// Produces an opaque verifier string for `password`.
    fn hash(&self, password: &str) -> String;
    /// Checks `password` against a verifier produced by [`Self::hash`].
    fn verify(&self, password: &str, verifier: &str) -> bool;
}

/// Development-grade hasher: SHA-256 over `"{salt}:{password}"`, with a
/// fixed per-process salt. Not suitable for production credential storage.
#[derive(Debug, Clone, Default)]
pub struct Sha256Hasher;

impl CredentialHasher for Sha256Hasher {
    fn hash(&self, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"cargohold-dev-salt:");
        hasher.update(password.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn verify(&self, password: &str, verifier: &str) -> bool {
        self.hash(password) == verifier
    }
}

/// Pluggable account store. The shipped implementation is in-memory; a
/// deployment backed by a real database implements the same trait.
pub trait UserStore: Clone + Send + Sync + 'static {
    /// Creates a new account.
    ///
    /// # Errors
    ///
    /// Returns [`UserStoreError::UsernameTaken`] if a case-insensitively
    /// equal username already exists.
    fn create_user(&self, username: &str, password: &str, email: &str) -> Result<UserRecord, UserStoreError>;

    /// Verifies a login attempt, returning the matched record on success.
    ///
    /// # Errors
    ///
    /// Returns [`UserStoreError::NotFound`] or
    /// [`UserStoreError::InvalidCredentials`] as appropriate.
    fn verify_credentials(&self, username: &str, password: &str) -> Result<UserRecord, UserStoreError>;

    /// Looks up a user by id.
    fn find_by_id(&self, user_id: &str) -> Option<UserRecord>;
}

#[derive(Default)]
struct InMemoryUserStoreInner {
    by_lowercase_username: HashMap<String, String>,
    by_id: HashMap<String, UserRecord>,
    next_id: u64,
}

/// In-memory, mutex-guarded [`UserStore`] with a pluggable
/// [`CredentialHasher`]. Development-grade; data does not survive restart.
#[derive(Clone)]
pub struct InMemoryUserStore {
    inner: Arc<Mutex<InMemoryUserStoreInner>>,
    hasher: Arc<dyn CredentialHasher>,
}

impl InMemoryUserStore {
    /// Creates a new store using [`Sha256Hasher`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_hasher(Sha256Hasher)
    }

    /// Creates a new store using a custom hasher.
    #[must_use]
    pub fn with_hasher(hasher: impl CredentialHasher) -> Self {
        Self { inner: Arc::new(Mutex::new(InMemoryUserStoreInner::default())), hasher: Arc::new(hasher) }
    }

    #[allow(clippy::expect_used)]
    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryUserStoreInner> {
        self.inner.lock().expect("user store mutex poisoned")
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for InMemoryUserStore {
    fn create_user(&self, username: &str, password: &str, email: &str) -> Result<UserRecord, UserStoreError> {
        let key = username.to_lowercase();
        let credential = self.hasher.hash(password);
        let mut inner = self.lock();

        if inner.by_lowercase_username.contains_key(&key) {
            return Err(UserStoreError::UsernameTaken);
        }

        inner.next_id += 1;
        let user_id = format!("u{}", inner.next_id);
        let record = UserRecord {
            user_id: user_id.clone(),
            username: username.to_string(),
            email: email.to_string(),
            credential,
        };

        inner.by_lowercase_username.insert(key, user_id.clone());
        inner.by_id.insert(user_id, record.clone());
        Ok(record)
    }

    fn verify_credentials(&self, username: &str, password: &str) -> Result<UserRecord, UserStoreError> {
        let key = username.to_lowercase();
        let inner = self.lock();
        let user_id =
            inner.by_lowercase_username.get(&key).ok_or(UserStoreError::NotFound)?;
        let record = inner.by_id.get(user_id).ok_or(UserStoreError::NotFound)?;

        if self.hasher.verify(password, &record.credential) {
            Ok(record.clone())
        } else {
            Err(UserStoreError::InvalidCredentials)
        }
    }

    fn find_by_id(&self, user_id: &str) -> Option<UserRecord> {
        self.lock().by_id.get(user_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_login_succeeds() {
        let store = InMemoryUserStore::new();
        store.create_user("alice", "pw12345678", "a@x").unwrap();
        let record = store.verify_credentials("ALICE", "pw12345678").unwrap();
        assert_eq!(record.username, "alice");
    }

    #[test]
    fn duplicate_username_case_insensitive_rejected() {
        let store = InMemoryUserStore::new();
        store.create_user("alice", "pw1", "a@x").unwrap();
        let err = store.create_user("Alice", "pw2", "a2@x").unwrap_err();
        assert_eq!(err, UserStoreError::UsernameTaken);
    }

    #[test]
    fn wrong_password_rejected() {
        let store = InMemoryUserStore::new();
        store.create_user("alice", "pw12345678", "a@x").unwrap();
        let err = store.verify_credentials("alice", "wrong").unwrap_err();
        assert_eq!(err, UserStoreError::InvalidCredentials);
    }
}
