//! Authentication state shared across the application.
//!
//! [`AuthStore`] owns three slices that must move together: the in-memory
//! authenticated flag, the in-memory profile, and their durable mirror in a
//! [`KeyValueStore`]. Every transition writes storage first and then publishes
//! the new [`AuthState`] to subscribers.
//!
//! Each sign-in and clear starts a new session generation. Work started under
//! one generation must not publish its results into a later one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::types::User;
use crate::storage::{KeyValueStore, StorageError, keys};

/// Snapshot of the current authentication state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    /// Whether an access token is held.
    pub is_authenticated: bool,
    /// Profile of the signed-in user.
    pub profile: Option<User>,
}

/// Callback run synchronously whenever the session is cleared.
pub type SessionListener = Arc<dyn Fn() + Send + Sync>;

/// Handle to the authentication state.
///
/// Cheaply cloneable via `Arc`; every clone observes the same state.
#[derive(Clone)]
pub struct AuthStore {
    inner: Arc<AuthStoreInner>,
}

struct AuthStoreInner {
    storage: Arc<dyn KeyValueStore>,
    token: RwLock<Option<SecretString>>,
    state: watch::Sender<AuthState>,
    generation: AtomicU64,
    cleared_listeners: RwLock<Vec<SessionListener>>,
}

impl AuthStore {
    /// Restore the auth state persisted in `storage`.
    ///
    /// Presence of a non-empty access token alone decides whether the user is
    /// authenticated. An unreadable profile blob is logged and treated as
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be read.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Result<Self, StorageError> {
        let token = storage
            .get(keys::ACCESS_TOKEN)?
            .filter(|t| !t.is_empty())
            .map(SecretString::from);

        let profile = match storage.get(keys::PROFILE)? {
            Some(raw) => serde_json::from_str::<User>(&raw)
                .inspect_err(|e| warn!(error = %e, "Ignoring unreadable stored profile"))
                .ok(),
            None => None,
        };

        let state = AuthState {
            is_authenticated: token.is_some(),
            profile,
        };

        Ok(Self {
            inner: Arc::new(AuthStoreInner {
                storage,
                token: RwLock::new(token),
                state: watch::Sender::new(state),
                generation: AtomicU64::new(0),
                cleared_listeners: RwLock::new(Vec::new()),
            }),
        })
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    /// Whether an access token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated
    }

    /// Profile of the signed-in user.
    #[must_use]
    pub fn profile(&self) -> Option<User> {
        self.inner.state.borrow().profile.clone()
    }

    /// Access token to attach to requests.
    #[must_use]
    pub fn access_token(&self) -> Option<SecretString> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current session generation, bumped by every sign-in and clear.
    ///
    /// Capture it before an `.await` and compare afterwards to tell whether
    /// the session changed while the request was in flight.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Subscribe to state changes.
    ///
    /// The receiver sees the current state immediately and is notified on
    /// every sign-in and clear.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// Register a callback run synchronously at the end of every [`clear`](Self::clear).
    pub fn on_session_cleared(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.inner
            .cleared_listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    /// Record a successful login or registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable copy cannot be written. In-memory state
    /// is left untouched in that case, and no durable token is left behind.
    pub fn sign_in(&self, token: SecretString, user: User) -> Result<(), StorageError> {
        let profile = serde_json::to_string(&user)?;
        // The token alone decides authentication on load, so it goes last.
        self.inner.storage.set(keys::PROFILE, &profile)?;
        if let Err(e) = self
            .inner
            .storage
            .set(keys::ACCESS_TOKEN, token.expose_secret())
        {
            if let Err(cleanup) = self.inner.storage.remove(keys::PROFILE) {
                warn!(error = %cleanup, "Failed to roll back stored profile");
            }
            return Err(e);
        }

        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
        self.inner.state.send_replace(AuthState {
            is_authenticated: true,
            profile: Some(user),
        });

        info!("Session started");
        Ok(())
    }

    /// End the session: remove the durable copy, reset memory, notify listeners.
    ///
    /// In-memory state is always reset and listeners always run, even when
    /// the durable store fails; the first storage error is then returned.
    ///
    /// # Errors
    ///
    /// Returns an error if either durable key cannot be removed.
    pub fn clear(&self) -> Result<(), StorageError> {
        let token_removed = self.inner.storage.remove(keys::ACCESS_TOKEN);
        let profile_removed = self.inner.storage.remove(keys::PROFILE);

        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.state.send_replace(AuthState::default());

        let listeners = self
            .inner
            .cleared_listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in &listeners {
            listener();
        }

        info!("Session cleared");
        token_removed.and(profile_removed)
    }
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("state", &*self.inner.state.borrow())
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::api::types::fixtures;
    use crate::storage::MemoryStore;

    /// Memory store that refuses writes to one key.
    struct RefusingStore {
        entries: MemoryStore,
        refused: &'static str,
    }

    impl KeyValueStore for RefusingStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.entries.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == self.refused {
                return Err(StorageError::Io {
                    path: "refusing-store".into(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.entries.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.entries.remove(key)
        }
    }

    fn refusing(refused: &'static str) -> Arc<dyn KeyValueStore> {
        Arc::new(RefusingStore {
            entries: MemoryStore::new(),
            refused,
        })
    }

    fn store_with(entries: &[(&str, &str)]) -> Arc<dyn KeyValueStore> {
        let store = MemoryStore::new();
        for (key, value) in entries {
            store.set(key, value).unwrap();
        }
        Arc::new(store)
    }

    #[test]
    fn test_load_empty_storage() {
        let auth = AuthStore::load(store_with(&[])).unwrap();
        assert_eq!(auth.state(), AuthState::default());
        assert!(auth.access_token().is_none());
    }

    #[test]
    fn test_load_token_decides_authentication() {
        let auth = AuthStore::load(store_with(&[(keys::ACCESS_TOKEN, "Bearer abc")])).unwrap();
        assert!(auth.is_authenticated());
        assert!(auth.profile().is_none());

        let profile = serde_json::to_string(&fixtures::user("a@b.vn")).unwrap();
        let auth = AuthStore::load(store_with(&[(keys::PROFILE, &profile)])).unwrap();
        assert!(!auth.is_authenticated());
        assert_eq!(auth.profile().unwrap().email, "a@b.vn");
    }

    #[test]
    fn test_load_ignores_corrupt_profile() {
        let auth = AuthStore::load(store_with(&[
            (keys::ACCESS_TOKEN, "Bearer abc"),
            (keys::PROFILE, "{broken"),
        ]))
        .unwrap();
        assert!(auth.is_authenticated());
        assert!(auth.profile().is_none());
    }

    #[test]
    fn test_sign_in_writes_storage_and_memory() {
        let storage = store_with(&[]);
        let auth = AuthStore::load(Arc::clone(&storage)).unwrap();
        let mut rx = auth.subscribe();

        auth.sign_in(SecretString::from("Bearer abc"), fixtures::user("a@b.vn"))
            .unwrap();

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated);
        assert_eq!(
            storage.get(keys::ACCESS_TOKEN).unwrap().as_deref(),
            Some("Bearer abc")
        );
        assert!(storage.get(keys::PROFILE).unwrap().unwrap().contains("a@b.vn"));
        assert_eq!(auth.access_token().unwrap().expose_secret(), "Bearer abc");
    }

    #[test]
    fn test_clear_resets_everything_and_notifies() {
        let storage = store_with(&[]);
        let auth = AuthStore::load(Arc::clone(&storage)).unwrap();
        auth.sign_in(SecretString::from("Bearer abc"), fixtures::user("a@b.vn"))
            .unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        auth.on_session_cleared(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        auth.clear().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(auth.state(), AuthState::default());
        assert!(auth.access_token().is_none());
        assert_eq!(storage.get(keys::ACCESS_TOKEN).unwrap(), None);
        assert_eq!(storage.get(keys::PROFILE).unwrap(), None);
    }

    #[test]
    fn test_failed_profile_write_leaves_no_token() {
        let storage = refusing(keys::PROFILE);
        let auth = AuthStore::load(Arc::clone(&storage)).unwrap();

        let result = auth.sign_in(SecretString::from("Bearer abc"), fixtures::user("a@b.vn"));

        assert!(result.is_err());
        assert!(!auth.is_authenticated());
        assert_eq!(storage.get(keys::ACCESS_TOKEN).unwrap(), None);

        let reloaded = AuthStore::load(storage).unwrap();
        assert_eq!(reloaded.state(), AuthState::default());
    }

    #[test]
    fn test_failed_token_write_rolls_back_profile() {
        let storage = refusing(keys::ACCESS_TOKEN);
        let auth = AuthStore::load(Arc::clone(&storage)).unwrap();

        let result = auth.sign_in(SecretString::from("Bearer abc"), fixtures::user("a@b.vn"));

        assert!(result.is_err());
        assert!(!auth.is_authenticated());
        assert_eq!(storage.get(keys::PROFILE).unwrap(), None);
        assert_eq!(AuthStore::load(storage).unwrap().state(), AuthState::default());
    }

    #[test]
    fn test_generation_advances_on_sign_in_and_clear() {
        let auth = AuthStore::load(store_with(&[])).unwrap();
        let start = auth.generation();

        auth.sign_in(SecretString::from("Bearer abc"), fixtures::user("a@b.vn"))
            .unwrap();
        let signed_in = auth.generation();
        assert!(signed_in > start);

        auth.clear().unwrap();
        assert!(auth.generation() > signed_in);
    }

    #[test]
    fn test_failed_sign_in_keeps_generation() {
        let auth = AuthStore::load(refusing(keys::PROFILE)).unwrap();
        let start = auth.generation();
        assert!(
            auth.sign_in(SecretString::from("Bearer abc"), fixtures::user("a@b.vn"))
                .is_err()
        );
        assert_eq!(auth.generation(), start);
    }

    #[test]
    fn test_debug_redacts_token() {
        let auth = AuthStore::load(store_with(&[(keys::ACCESS_TOKEN, "Bearer hunter2")])).unwrap();
        let debug_output = format!("{auth:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2"));
    }
}
