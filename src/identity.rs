//! Anonymous player identity
//!
//! The identity provider is external; all the game needs from it is a
//! stable opaque id per session. The id doubles as the record key in the
//! score store, so it must be a single path segment.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Characters the realtime database refuses in a key
const FORBIDDEN_KEY_CHARS: &[char] = &['/', '.', '#', '$', '[', ']'];

/// Opaque per-session player id
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerIdentity(String);

impl PlayerIdentity {
    /// Validate and wrap a provider-issued id
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty()
            || id.contains(FORBIDDEN_KEY_CHARS)
            || id.chars().any(|c| c.is_control())
        {
            return Err(Error::InvalidIdentity);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PlayerIdentity {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PlayerIdentity> for String {
    fn from(id: PlayerIdentity) -> Self {
        id.0
    }
}

/// External anonymous sign-in
#[allow(async_fn_in_trait)]
pub trait AnonymousAuth {
    /// Sign in anonymously, returning the provider's id for this session.
    /// Fails with `Error::AuthUnavailable`.
    async fn sign_in_anonymously(&self) -> Result<PlayerIdentity>;
}

/// Provider that mints random v4 UUIDs locally (headless/native builds)
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalAnonymousAuth;

#[cfg(not(target_arch = "wasm32"))]
impl AnonymousAuth for LocalAnonymousAuth {
    async fn sign_in_anonymously(&self) -> Result<PlayerIdentity> {
        // Simple form has no hyphens or dots, so it is always a valid key
        let id = uuid::Uuid::new_v4().simple().to_string();
        log::debug!("Issued local anonymous id {}", id);
        PlayerIdentity::new(id)
    }
}

/// Test doubles for the identity provider
#[cfg(test)]
pub(crate) mod fakes {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Always returns the same id and counts sign-ins
    #[derive(Debug)]
    pub struct FixedAuth {
        pub id: &'static str,
        pub calls: AtomicUsize,
    }

    impl FixedAuth {
        pub fn new(id: &'static str) -> Self {
            Self {
                id,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AnonymousAuth for FixedAuth {
        async fn sign_in_anonymously(&self) -> Result<PlayerIdentity> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            PlayerIdentity::new(self.id)
        }
    }

    /// Provider that is never reachable
    #[derive(Debug, Default)]
    pub struct DownAuth;

    impl AnonymousAuth for DownAuth {
        async fn sign_in_anonymously(&self) -> Result<PlayerIdentity> {
            Err(Error::AuthUnavailable("provider offline".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_rejects_empty() {
        assert_eq!(PlayerIdentity::new(""), Err(Error::InvalidIdentity));
    }

    #[test]
    fn test_identity_rejects_path_characters() {
        for bad in ["a/b", "a.b", "a#b", "a$b", "a[b", "a]b", "a\nb"] {
            assert_eq!(PlayerIdentity::new(bad), Err(Error::InvalidIdentity), "{bad:?}");
        }
        assert!(PlayerIdentity::new("Xy9_-uid").is_ok());
    }

    #[test]
    fn test_identity_serde_validates() {
        let id: PlayerIdentity = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(id.as_str(), "abc");
        assert!(serde_json::from_str::<PlayerIdentity>("\"\"").is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }

    #[test]
    fn test_local_auth_issues_unique_ids() {
        let auth = LocalAnonymousAuth;
        let a = pollster::block_on(auth.sign_in_anonymously()).unwrap();
        let b = pollster::block_on(auth.sign_in_anonymously()).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }
}
