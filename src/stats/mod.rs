//! Flat `key value` statistics produced by the load instrumentation tool.
//!
//! Every non-empty line of a stats file carries one dot-delimited key and one
//! unsigned count, e.g. `load.RIP.4B 1024`. The whole file is parsed into a
//! [`StatRecord`] in one pass; any malformed line aborts the parse.

mod loader;

pub use loader::StatsError;

use std::collections::HashMap;

use crate::summary::SummaryError;

/// Immutable mapping from statistic key to count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatRecord {
    values: HashMap<String, u64>,
}

impl StatRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored under `key`, if present.
    pub fn get(&self, key: &str) -> Option<u64> {
        self.values.get(key).copied()
    }

    /// Value stored under `key`, treating absence as a fatal lookup failure.
    pub fn require(&self, key: &str) -> Result<u64, SummaryError> {
        self.get(key).ok_or_else(|| SummaryError::MissingKey {
            key: key.to_string(),
        })
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record holds no keys at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(key, value)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Insert a value, returning the one it replaced.
    fn insert(&mut self, key: String, value: u64) -> Option<u64> {
        self.values.insert(key, value)
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for StatRecord {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut record = StatRecord::new();
        record.extend(iter);
        record
    }
}

impl<K: Into<String>> Extend<(K, u64)> for StatRecord {
    fn extend<I: IntoIterator<Item = (K, u64)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key.into(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_reports_missing_key() {
        let record: StatRecord = [("load.vector", 3u64)].into_iter().collect();
        assert_eq!(record.require("load.vector").unwrap(), 3);

        let err = record.require("load.non_vector").unwrap_err();
        assert!(matches!(err, SummaryError::MissingKey { ref key } if key == "load.non_vector"));
    }

    #[test]
    fn iter_yields_every_pair() {
        let record: StatRecord = [("a", 1u64), ("b", 2u64)].into_iter().collect();
        let mut pairs: Vec<_> = record.iter().collect();
        pairs.sort_unstable();
        assert_eq!(pairs, [("a", 1), ("b", 2)]);
        assert!(StatRecord::new().is_empty());
    }

    #[test]
    fn collect_keeps_last_value_for_duplicate_keys() {
        let record: StatRecord = [("a", 1u64), ("a", 7u64), ("b", 2u64)]
            .into_iter()
            .collect();
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("a"), Some(7));
    }
}
