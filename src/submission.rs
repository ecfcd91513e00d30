//! Score submission
//!
//! One record per identity; each run's score replaces the previous one.

use crate::error::{Error, Result};
use crate::identity::PlayerIdentity;
use crate::leaderboard::ScoreRecord;
use crate::persistence::{ScoreStore, child_path};

/// Write `score` as the player's record under `collection`.
///
/// Fails fast with `InvalidIdentity` when the session never signed in;
/// nothing is written in that case. The write is a full overwrite, so the
/// previous score and name for this identity are gone afterwards.
pub async fn submit<S: ScoreStore>(
    store: &S,
    collection: &str,
    identity: Option<&PlayerIdentity>,
    display_name: &str,
    score: u64,
    submitted_at: u64,
) -> Result<ScoreRecord> {
    let identity = identity.ok_or(Error::InvalidIdentity)?;

    let record = ScoreRecord {
        identity: identity.clone(),
        display_name: display_name.to_string(),
        score,
        submitted_at,
    };
    let value = serde_json::to_value(&record)
        .map_err(|e| Error::StoreUnavailable(format!("encode failed: {}", e)))?;

    store
        .write(&child_path(collection, identity.as_str()), &value)
        .await?;
    Ok(record)
}
