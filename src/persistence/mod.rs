//! Remote score store
//!
//! Features:
//! - Realtime-database style document store: full-value writes at a path
//! - Ordered child queries (`orderByChild` + `limitToLast`, `equalTo`)
//! - In-process emulation for native builds and tests
//! - Firebase REST backend in the browser, with id token refresh

pub mod memory;
pub mod token;
#[cfg(target_arch = "wasm32")]
pub mod firebase;

use std::cmp::Ordering;

use serde_json::Value;

use crate::error::Result;

pub use memory::MemoryStore;

/// Document store holding the leaderboard
#[allow(async_fn_in_trait)]
pub trait ScoreStore {
    /// Replace the whole value at `path` (no merge)
    async fn write(&self, path: &str, value: &Value) -> Result<()>;

    /// Children of `collection` ordered ascending by their `child` field,
    /// keeping only the last `limit_to_last` of them.
    ///
    /// Fails with `Error::StoreUnavailable`.
    async fn read_ordered_by_child(
        &self,
        collection: &str,
        child: &str,
        limit_to_last: usize,
    ) -> Result<Vec<(String, Value)>>;

    /// Children of `collection` whose `child` field equals `value`, in key
    /// order.
    ///
    /// Fails with `Error::StoreUnavailable`.
    async fn read_equal_to(
        &self,
        collection: &str,
        child: &str,
        value: &Value,
    ) -> Result<Vec<(String, Value)>>;
}

impl<T: ScoreStore + ?Sized> ScoreStore for &T {
    async fn write(&self, path: &str, value: &Value) -> Result<()> {
        (**self).write(path, value).await
    }

    async fn read_ordered_by_child(
        &self,
        collection: &str,
        child: &str,
        limit_to_last: usize,
    ) -> Result<Vec<(String, Value)>> {
        (**self)
            .read_ordered_by_child(collection, child, limit_to_last)
            .await
    }

    async fn read_equal_to(
        &self,
        collection: &str,
        child: &str,
        value: &Value,
    ) -> Result<Vec<(String, Value)>> {
        (**self).read_equal_to(collection, child, value).await
    }
}

/// Join a collection and key into a store path
pub fn child_path(collection: &str, key: &str) -> String {
    format!("{}/{}", collection.trim_matches('/'), key)
}

/// Type class of a child value in query order: missing/null, false, true,
/// numbers, strings, then objects and arrays.
fn value_class(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(false)) => 1,
        Some(Value::Bool(true)) => 2,
        Some(Value::Number(_)) => 3,
        Some(Value::String(_)) => 4,
        Some(Value::Array(_)) | Some(Value::Object(_)) => 5,
    }
}

fn compare_child(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    value_class(a)
        .cmp(&value_class(b))
        .then_with(|| match (a, b) {
            (Some(Value::Number(x)), Some(Value::Number(y))) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
            _ => Ordering::Equal,
        })
}

/// Apply `orderByChild(child)` + `limitToLast(limit)` to a set of children.
/// Ties fall back to key order.
pub fn order_by_child(
    mut entries: Vec<(String, Value)>,
    child: &str,
    limit_to_last: usize,
) -> Vec<(String, Value)> {
    entries.sort_by(|(ka, va), (kb, vb)| {
        compare_child(va.get(child), vb.get(child)).then_with(|| ka.cmp(kb))
    });
    let skip = entries.len().saturating_sub(limit_to_last);
    entries.split_off(skip)
}

/// Apply `orderByChild(child)` + `equalTo(value)` to a set of children
pub fn filter_equal_to(
    mut entries: Vec<(String, Value)>,
    child: &str,
    value: &Value,
) -> Vec<(String, Value)> {
    entries.retain(|(_, v)| compare_child(v.get(child), Some(value)) == Ordering::Equal);
    entries.sort_by(|(ka, _), (kb, _)| ka.cmp(kb));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(entries: &[(String, Value)]) -> Vec<&str> {
        entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn test_order_by_child_ascending_suffix() {
        let entries = vec![
            ("a".to_string(), json!({ "score": 500 })),
            ("b".to_string(), json!({ "score": 900 })),
            ("c".to_string(), json!({ "score": 300 })),
        ];
        let ordered = order_by_child(entries, "score", 2);
        assert_eq!(keys(&ordered), vec!["a", "b"]);
    }

    #[test]
    fn test_order_by_child_missing_sorts_first() {
        let entries = vec![
            ("x".to_string(), json!({ "score": 1 })),
            ("y".to_string(), json!({ "name": "no score" })),
            ("z".to_string(), json!("scalar")),
        ];
        let ordered = order_by_child(entries, "score", 10);
        assert_eq!(keys(&ordered), vec!["y", "z", "x"]);
    }

    #[test]
    fn test_order_by_child_ties_by_key() {
        let entries = vec![
            ("m".to_string(), json!({ "score": 7 })),
            ("d".to_string(), json!({ "score": 7 })),
        ];
        let ordered = order_by_child(entries, "score", 10);
        assert_eq!(keys(&ordered), vec!["d", "m"]);
    }

    #[test]
    fn test_order_by_child_zero_limit() {
        let entries = vec![("a".to_string(), json!({ "score": 1 }))];
        assert!(order_by_child(entries, "score", 0).is_empty());
    }

    #[test]
    fn test_filter_equal_to_matches_value_and_class() {
        let entries = vec![
            ("z".to_string(), json!({ "score": 100 })),
            ("a".to_string(), json!({ "score": 100.0 })),
            ("m".to_string(), json!({ "score": 99 })),
            ("s".to_string(), json!({ "score": "100" })),
            ("n".to_string(), json!({ "name": "no score" })),
        ];
        let matched = filter_equal_to(entries, "score", &json!(100));
        assert_eq!(keys(&matched), vec!["a", "z"]);
    }

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("leaderboard", "uid1"), "leaderboard/uid1");
        assert_eq!(child_path("/leaderboard/", "uid1"), "leaderboard/uid1");
    }
}
