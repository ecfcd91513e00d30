//! Per-session player context
//!
//! Holds the anonymous identity once sign-in succeeds and the display name
//! used for submissions. Created at page load, dropped when the page goes.

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::identity::{AnonymousAuth, PlayerIdentity};
use crate::platform::ClientStorage;

/// Name used when the player never saved one
pub const GUEST_NAME: &str = "Guest";

/// Saved display name from client storage, or `"Guest"`
pub fn resolve_display_name<C: ClientStorage>(storage: &C, key: &str) -> String {
    match storage.get(key) {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => GUEST_NAME.to_string(),
    }
}

/// Session state shared by submission and name handling.
///
/// Locks are only taken for reads/writes of the fields, never across an
/// await.
#[derive(Debug)]
pub struct Session {
    identity: Mutex<Option<PlayerIdentity>>,
    display_name: Mutex<String>,
    username_key: String,
}

impl Session {
    /// Start a session, picking up any saved display name
    pub fn new<C: ClientStorage>(storage: &C, username_key: &str) -> Self {
        let display_name = resolve_display_name(storage, username_key);
        log::info!("Session started as {}", display_name);
        Self {
            identity: Mutex::new(None),
            display_name: Mutex::new(display_name),
            username_key: username_key.to_string(),
        }
    }

    /// Identity, if sign-in has succeeded
    pub fn identity(&self) -> Option<PlayerIdentity> {
        self.identity.lock().clone()
    }

    pub fn display_name(&self) -> String {
        self.display_name.lock().clone()
    }

    /// Sign in once per session; later calls return the cached identity.
    ///
    /// On failure the session stays without an identity, so later
    /// submissions are refused with `InvalidIdentity`.
    pub async fn ensure_identity<A: AnonymousAuth>(&self, auth: &A) -> Result<PlayerIdentity> {
        if let Some(id) = self.identity() {
            return Ok(id);
        }

        let id = auth.sign_in_anonymously().await.map_err(|e| match e {
            Error::AuthUnavailable(msg) => Error::AuthUnavailable(msg),
            other => Error::AuthUnavailable(other.to_string()),
        })?;

        // A concurrent sign-in may have landed first; keep that one
        let mut slot = self.identity.lock();
        let id = slot.get_or_insert(id).clone();
        log::info!("Signed in anonymously as {}", id);
        Ok(id)
    }

    /// Save a new display name and use it for later submissions.
    ///
    /// Blank input is ignored. Returns whether the name changed. Records
    /// already in the store keep the name they were written with.
    pub fn set_display_name<C: ClientStorage>(&self, storage: &C, raw: &str) -> bool {
        let name = raw.trim();
        if name.is_empty() {
            return false;
        }

        if let Err(e) = storage.set(&self.username_key, name) {
            log::warn!("Display name not saved: {}", e);
        }
        *self.display_name.lock() = name.to_string();
        log::info!("Display name set to {}", name);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::fakes::{DownAuth, FixedAuth};
    use crate::platform::MemoryStorage;
    use pollster::block_on;

    struct ReadOnlyStorage;

    impl ClientStorage for ReadOnlyStorage {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::ClientStorage("quota exceeded".into()))
        }
    }

    #[test]
    fn test_resolve_display_name_defaults_to_guest() {
        let storage = MemoryStorage::new();
        assert_eq!(resolve_display_name(&storage, "username"), "Guest");

        storage.set("username", "   ").unwrap();
        assert_eq!(resolve_display_name(&storage, "username"), "Guest");
    }

    #[test]
    fn test_resolve_display_name_uses_saved_name() {
        let storage = MemoryStorage::with_item("username", "Alice");
        assert_eq!(resolve_display_name(&storage, "username"), "Alice");
    }

    #[test]
    fn test_ensure_identity_is_cached() {
        let storage = MemoryStorage::new();
        let session = Session::new(&storage, "username");
        let auth = FixedAuth::new("uid-1");

        let first = block_on(session.ensure_identity(&auth)).unwrap();
        let second = block_on(session.ensure_identity(&auth)).unwrap();
        assert_eq!(first, second);
        assert_eq!(auth.calls(), 1);
        assert_eq!(session.identity(), Some(first));
    }

    #[test]
    fn test_ensure_identity_failure_leaves_no_identity() {
        let storage = MemoryStorage::new();
        let session = Session::new(&storage, "username");

        let err = block_on(session.ensure_identity(&DownAuth)).unwrap_err();
        assert!(matches!(err, Error::AuthUnavailable(_)));
        assert_eq!(session.identity(), None);

        // A later attempt with a working provider still succeeds
        let auth = FixedAuth::new("uid-2");
        assert!(block_on(session.ensure_identity(&auth)).is_ok());
    }

    #[test]
    fn test_set_display_name_persists_and_updates() {
        let storage = MemoryStorage::new();
        let session = Session::new(&storage, "username");
        assert_eq!(session.display_name(), "Guest");

        assert!(session.set_display_name(&storage, "  Alice "));
        assert_eq!(session.display_name(), "Alice");
        assert_eq!(storage.get("username").as_deref(), Some("Alice"));

        // New sessions pick the saved name up
        let next = Session::new(&storage, "username");
        assert_eq!(next.display_name(), "Alice");
    }

    #[test]
    fn test_set_display_name_ignores_blank() {
        let storage = MemoryStorage::with_item("username", "Alice");
        let session = Session::new(&storage, "username");
        assert!(!session.set_display_name(&storage, "   "));
        assert_eq!(session.display_name(), "Alice");
        assert_eq!(storage.get("username").as_deref(), Some("Alice"));
    }

    #[test]
    fn test_set_display_name_survives_storage_failure() {
        let session = Session::new(&ReadOnlyStorage, "username");
        assert!(session.set_display_name(&ReadOnlyStorage, "Bob"));
        assert_eq!(session.display_name(), "Bob");
    }
}
