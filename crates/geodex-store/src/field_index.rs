//! Exact-value index: (field, value) → set of keys.

use geodex_core::{Key, Value};
use std::collections::{BTreeSet, HashMap};

/// Derived index over record field values, maintained incrementally as
/// records are added, updated and removed. Values are keyed by their
/// canonical form ([`Value::index_key`]); key sets are ordered so index
/// hits come back deterministically.
#[derive(Debug, Clone, Default)]
pub struct FieldIndex {
    map: HashMap<String, HashMap<String, BTreeSet<Key>>>,
}

impl FieldIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &str, value: &Value, key: &Key) {
        self.map
            .entry(field.to_string())
            .or_default()
            .entry(value.index_key())
            .or_default()
            .insert(key.clone());
    }

    pub fn remove(&mut self, field: &str, value: &Value, key: &Key) {
        let Some(by_value) = self.map.get_mut(field) else {
            return;
        };
        let value_key = value.index_key();
        if let Some(keys) = by_value.get_mut(&value_key) {
            keys.remove(key);
            if keys.is_empty() {
                by_value.remove(&value_key);
            }
        }
        if by_value.is_empty() {
            self.map.remove(field);
        }
    }

    /// Keys whose `field` equals `value` exactly.
    pub fn lookup(&self, field: &str, value: &Value) -> Option<&BTreeSet<Key>> {
        self.map.get(field)?.get(&value.index_key())
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_lookup_remove() {
        let mut index = FieldIndex::new();
        let city = Value::from("PAR");
        index.insert("city_code", &city, &Key::from("ORY"));
        index.insert("city_code", &city, &Key::from("CDG"));

        let keys = index.lookup("city_code", &city).unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("ORY"));

        index.remove("city_code", &city, &Key::from("ORY"));
        assert_eq!(index.lookup("city_code", &city).unwrap().len(), 1);

        index.remove("city_code", &city, &Key::from("CDG"));
        assert!(index.lookup("city_code", &city).is_none());
    }

    #[test]
    fn test_lookup_distinguishes_value_variants() {
        let mut index = FieldIndex::new();
        index.insert("lines", &Value::from("a b"), &Key::from("X"));
        let as_list = Value::List(vec!["a".into(), "b".into()]);
        assert!(index.lookup("lines", &as_list).is_none());
    }
}
