//! In-process realtime database emulation

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde_json::Value;

use super::{ScoreStore, filter_equal_to, order_by_child};
use crate::error::{Error, Result};

/// Path-keyed document store with per-key atomic overwrites
///
/// Paths are flat keys, not a tree: writing `leaderboard` leaves its
/// children in place, and writing `leaderboard/b/nested` does not touch
/// `leaderboard/b`. A realtime database would treat both as subtree writes.
/// Queries only see direct children of a collection.
#[derive(Debug)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<String, Value>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            docs: Mutex::new(BTreeMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the backend going offline (or coming back)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Value stored at `path`, if any
    pub fn get(&self, path: &str) -> Option<Value> {
        self.docs.lock().get(path.trim_matches('/')).cloned()
    }

    /// Number of direct children under `collection`
    pub fn child_count(&self, collection: &str) -> usize {
        let prefix = format!("{}/", collection.trim_matches('/'));
        self.docs
            .lock()
            .keys()
            .filter(|k| k.strip_prefix(&prefix).is_some_and(|rest| !rest.contains('/')))
            .count()
    }

    fn direct_children(&self, collection: &str) -> Vec<(String, Value)> {
        let prefix = format!("{}/", collection.trim_matches('/'));
        self.docs
            .lock()
            .iter()
            .filter_map(|(path, value)| {
                let key = path.strip_prefix(&prefix)?;
                (!key.contains('/')).then(|| (key.to_string(), value.clone()))
            })
            .collect()
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::StoreUnavailable("memory store offline".into()))
        }
    }
}

impl ScoreStore for MemoryStore {
    async fn write(&self, path: &str, value: &Value) -> Result<()> {
        self.check_available()?;
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Err(Error::StoreUnavailable("refusing to overwrite the root".into()));
        }
        self.docs.lock().insert(path.to_string(), value.clone());
        Ok(())
    }

    async fn read_ordered_by_child(
        &self,
        collection: &str,
        child: &str,
        limit_to_last: usize,
    ) -> Result<Vec<(String, Value)>> {
        self.check_available()?;
        Ok(order_by_child(self.direct_children(collection), child, limit_to_last))
    }

    async fn read_equal_to(
        &self,
        collection: &str,
        child: &str,
        value: &Value,
    ) -> Result<Vec<(String, Value)>> {
        self.check_available()?;
        Ok(filter_equal_to(self.direct_children(collection), child, value))
    }
}
