//! Error types for the leaderboard flow
//!
//! Every variant is logged and swallowed by `LeaderboardService`; none of
//! them may reach the per-frame update path.

/// Leaderboard, identity and storage errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Identity provider unreachable or anonymous sign-in refused
    #[error("anonymous sign-in unavailable: {0}")]
    AuthUnavailable(String),

    /// A score was submitted without a resolved identity
    #[error("no valid player identity for this session")]
    InvalidIdentity,

    /// Network or store failure on read or write
    #[error("score store unavailable: {0}")]
    StoreUnavailable(String),

    /// Client-side storage (LocalStorage) rejected a write
    #[error("client storage error: {0}")]
    ClientStorage(String),

    /// Malformed settings or tuning data
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether a later attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::AuthUnavailable(_) | Error::StoreUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
