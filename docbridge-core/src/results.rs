//! Result handle for store queries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A windowed set of records produced by a query engine.
///
/// `items` holds the records inside the requested `start`/`count` window;
/// `total` is the number of records that matched the filter before the
/// window was applied, so callers can page without re-running the query.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct QueryResults {
    items: Vec<Value>,
    total: usize,
}

impl QueryResults {
    /// Creates a result set from windowed items and the pre-window total.
    pub fn new(items: Vec<Value>, total: usize) -> Self {
        Self { items, total }
    }

    /// The records inside the result window.
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Number of records that matched the filter, ignoring the window.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of records in this window.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the records in the window.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    /// Consumes the handle, returning the windowed records.
    pub fn into_items(self) -> Vec<Value> {
        self.items
    }
}

impl IntoIterator for QueryResults {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a QueryResults {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_is_empty_with_zero_total() {
        let results = QueryResults::default();

        assert!(results.is_empty());
        assert_eq!(results.total(), 0);
    }

    #[test]
    fn total_is_independent_of_window_length() {
        let results = QueryResults::new(vec![json!({"a": 1})], 42);

        assert_eq!(results.len(), 1);
        assert_eq!(results.total(), 42);
    }

    #[test]
    fn iteration_preserves_order() {
        let results = QueryResults::new(vec![json!(1), json!(2), json!(3)], 3);
        let collected: Vec<_> = results.into_iter().collect();

        assert_eq!(collected, vec![json!(1), json!(2), json!(3)]);
    }
}
