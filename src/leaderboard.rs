//! Online leaderboard
//!
//! One record per player in the score store, top rows re-read and ranked
//! locally after every run.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::identity::PlayerIdentity;
use crate::persistence::ScoreStore;

/// Record field the store orders by
pub const SCORE_FIELD: &str = "score";

/// Heading shown above the ranked rows
pub const LEADERBOARD_HEADING: &str = "Leaderboard:";

/// A player's latest score, stored at `<leaderboard>/<identity>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    #[serde(rename = "userId")]
    pub identity: PlayerIdentity,
    #[serde(rename = "username")]
    pub display_name: String,
    pub score: u64,
    /// Unix timestamp (ms) of the submission, used to break score ties
    #[serde(rename = "submittedAt", default)]
    pub submitted_at: u64,
}

impl ScoreRecord {
    /// Display order: higher score first, then earlier submission, then id
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| self.submitted_at.cmp(&other.submitted_at))
            .then_with(|| self.identity.cmp(&other.identity))
    }
}

/// Ranked top-K rows, rebuilt on every refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaderboardView {
    entries: Vec<ScoreRecord>,
}

impl LeaderboardView {
    /// Rank `records` for display and keep at most `k` of them
    pub fn from_records(mut records: Vec<ScoreRecord>, k: usize) -> Self {
        records.sort_by(ScoreRecord::rank_cmp);
        records.truncate(k);
        Self { entries: records }
    }

    pub fn entries(&self) -> &[ScoreRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// 1-indexed rank of a player on this board
    pub fn rank_of(&self, identity: &PlayerIdentity) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| &e.identity == identity)
            .map(|i| i + 1)
    }

    /// `"<rank>. <name>: <score>"` per entry
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{}. {}: {}", i + 1, e.display_name, e.score))
            .collect()
    }

    /// Full text for the on-screen leaderboard panel
    pub fn display_text(&self) -> String {
        let mut text = format!("{}\n", LEADERBOARD_HEADING);
        text.push_str(&self.to_string());
        text
    }
}

impl fmt::Display for LeaderboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

/// Read the `k` best records from `collection` and rank them.
///
/// The store hands back the highest scores in *ascending* order, so the
/// local re-sort is what puts first place on top. `limitToLast` splits ties
/// at the cut by key, so a full page also pulls in every row tied with its
/// lowest score before ranking. Rows that do not decode, or whose `userId`
/// disagrees with their key, are skipped.
pub async fn fetch_top<S: ScoreStore>(
    store: &S,
    collection: &str,
    k: usize,
) -> Result<LeaderboardView> {
    if k == 0 {
        return Ok(LeaderboardView::default());
    }

    let mut rows = store.read_ordered_by_child(collection, SCORE_FIELD, k).await?;
    log::debug!("Leaderboard query returned {} rows", rows.len());

    let boundary = match rows.first() {
        Some((_, value)) if rows.len() == k => value.get(SCORE_FIELD).cloned(),
        _ => None,
    };
    if let Some(boundary) = boundary {
        let ties = store.read_equal_to(collection, SCORE_FIELD, &boundary).await?;
        log::debug!("{} rows tied at the cut ({})", ties.len(), boundary);
        let merged: BTreeMap<String, Value> = rows.into_iter().chain(ties).collect();
        rows = merged.into_iter().collect();
    }

    let records = rows
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value::<ScoreRecord>(value) {
            Ok(record) if record.identity.as_str() == key => Some(record),
            Ok(record) => {
                log::warn!(
                    "Skipping leaderboard row {}: belongs to {}",
                    key,
                    record.identity
                );
                None
            }
            Err(e) => {
                log::warn!("Skipping malformed leaderboard row {}: {}", key, e);
                None
            }
        })
        .collect();

    Ok(LeaderboardView::from_records(records, k))
}
