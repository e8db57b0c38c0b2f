//! The record store.
//!
//! Records live in a vector in insertion order, with a key → position map
//! for direct lookup. The store owns the duplicate-key policy and the
//! field index, and shares its generation counter with the key iterators
//! it hands out so they can detect mutation mid-iteration.

use crate::field_index::FieldIndex;
use geodex_core::config::DuplicatePolicy;
use geodex_core::ports::CoordinateFields;
use geodex_core::{FieldMap, GeoPoint, GeodexError, Key, Record, Result, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Insertion-ordered owner of every loaded record.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    positions: HashMap<Key, usize>,
    field_names: Vec<String>,
    index: FieldIndex,
    coordinates: Option<CoordinateFields>,
    policy: DuplicatePolicy,
    generation: Arc<AtomicU64>,
}

impl RecordStore {
    pub fn new(policy: DuplicatePolicy, coordinates: Option<CoordinateFields>) -> Self {
        Self { policy, coordinates, ..Self::default() }
    }

    /// Insert a record. On key collision the duplicate policy decides:
    /// `Rename` mints the first free `"{key}@{n}"`, links it to the
    /// original through the reserved duplicate/parent data and keeps the
    /// row; `Discard` drops it. Returns the key actually used, `None`
    /// when the row was discarded.
    pub fn add(&mut self, key: Key, fields: FieldMap, line_number: u64) -> Option<Key> {
        let used = if self.positions.contains_key(&key) {
            match self.policy {
                DuplicatePolicy::Discard => {
                    tracing::debug!(%key, line_number, "discarded row under duplicate key");
                    return None;
                }
                DuplicatePolicy::Rename => {
                    let derived = self.first_free_derived(&key);
                    if let Some(&parent_pos) = self.positions.get(&key) {
                        self.records[parent_pos].link_duplicate(derived.clone());
                    }
                    derived
                }
            }
        } else {
            key.clone()
        };

        let mut record = Record::new(used.clone(), fields, line_number);
        if used != key {
            record.link_parent(key);
        }
        record.set_point(self.resolve_point(record.fields()));

        for (name, value) in record.fields().iter() {
            self.index.insert(name, value, &used);
        }
        for name in record.fields().names() {
            self.register_field(name);
        }

        self.positions.insert(used.clone(), self.records.len());
        self.records.push(record);
        self.bump();
        Some(used)
    }

    pub fn get(&self, key: &str) -> Result<&Record> {
        self.positions
            .get(key)
            .map(|&pos| &self.records[pos])
            .ok_or_else(|| GeodexError::NotFound { key: key.to_string() })
    }

    /// A single field value. An unknown key is [`GeodexError::NotFound`];
    /// a field the record does not carry is [`GeodexError::InvalidField`].
    pub fn value(&self, key: &str, field: &str) -> Result<Value> {
        let record = self.get(key)?;
        record
            .field(field)
            .cloned()
            .ok_or_else(|| GeodexError::InvalidField { field: field.to_string() })
    }

    /// Upsert one field. A missing record is created on the spot (with
    /// line number 0); a new field name joins the ordered field registry.
    pub fn set(&mut self, key: Key, field: impl Into<String>, value: Value) {
        let field = field.into();
        let pos = match self.positions.get(&key).copied() {
            Some(pos) => pos,
            None => {
                let pos = self.records.len();
                tracing::debug!(%key, "set created a new record");
                self.positions.insert(key.clone(), pos);
                self.records.push(Record::new(key.clone(), FieldMap::new(), 0));
                pos
            }
        };

        let previous = self.records[pos].set_field(field.clone(), value.clone());
        if let Some(previous) = &previous {
            self.index.remove(&field, previous, &key);
        }
        self.index.insert(&field, &value, &key);
        self.register_field(&field);

        if self.is_coordinate_field(&field) {
            let point = self.resolve_point(self.records[pos].fields());
            self.records[pos].set_point(point);
        }
        self.bump();
    }

    /// Delete a record and evict it from the field index. Reserved links
    /// pointing at the removed key are left in place; they describe how
    /// the data was loaded, not what is currently present.
    pub fn remove(&mut self, key: &str) -> Result<Record> {
        let pos = self
            .positions
            .remove(key)
            .ok_or_else(|| GeodexError::NotFound { key: key.to_string() })?;
        let record = self.records.remove(pos);
        for (name, value) in record.fields().iter() {
            self.index.remove(name, value, record.key());
        }
        for (i, shifted) in self.records.iter().enumerate().skip(pos) {
            if let Some(slot) = self.positions.get_mut(shifted.key()) {
                *slot = i;
            }
        }
        self.bump();
        Ok(record)
    }

    /// Delete one field of a record, returning the removed value.
    pub fn remove_field(&mut self, key: &str, field: &str) -> Result<Value> {
        let pos = self
            .positions
            .get(key)
            .copied()
            .ok_or_else(|| GeodexError::NotFound { key: key.to_string() })?;
        let removed = self.records[pos]
            .remove_field(field)
            .ok_or_else(|| GeodexError::InvalidField { field: field.to_string() })?;
        let owner = self.records[pos].key().clone();
        self.index.remove(field, &removed, &owner);
        if self.is_coordinate_field(field) {
            let point = self.resolve_point(self.records[pos].fields());
            self.records[pos].set_point(point);
        }
        self.bump();
        Ok(removed)
    }

    /// Snapshot iterator over keys in insertion order; fails fast once
    /// the store mutates under it.
    pub fn keys(&self) -> Keys {
        Keys {
            keys: self.records.iter().map(|r| r.key().clone()).collect(),
            cursor: 0,
            generation: Arc::clone(&self.generation),
            observed: self.generation(),
        }
    }

    /// Records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// `(key, point)` entries for the geo-tagged records, the input the
    /// spatial grid is built from.
    pub fn geo_entries(&self) -> impl Iterator<Item = (Key, GeoPoint)> + '_ {
        self.records.iter().filter_map(|r| r.point().map(|p| (r.key().clone(), p)))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    /// Insertion position of a key.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Known field names, in first-seen order.
    pub fn fields(&self) -> &[String] {
        &self.field_names
    }

    pub fn knows_field(&self, name: &str) -> bool {
        self.field_names.iter().any(|f| f == name)
    }

    /// Keys whose `field` equals `value` exactly, via the field index.
    pub fn find_exact(&self, field: &str, value: &Value) -> Option<&BTreeSet<Key>> {
        self.index.lookup(field, value)
    }

    pub fn key_set(&self) -> BTreeSet<Key> {
        self.records.iter().map(|r| r.key().clone()).collect()
    }

    pub fn coordinates(&self) -> Option<&CoordinateFields> {
        self.coordinates.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn first_free_derived(&self, base: &Key) -> Key {
        let mut n = 1;
        loop {
            let candidate = base.derived(n);
            if !self.positions.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn register_field(&mut self, name: &str) {
        if !self.knows_field(name) {
            self.field_names.push(name.to_string());
        }
    }

    fn is_coordinate_field(&self, field: &str) -> bool {
        self.coordinates
            .as_ref()
            .is_some_and(|c| c.latitude == field || c.longitude == field)
    }

    fn resolve_point(&self, fields: &FieldMap) -> Option<GeoPoint> {
        let coords = self.coordinates.as_ref()?;
        let lat = fields.get(&coords.latitude)?.to_f64()?;
        let lng = fields.get(&coords.longitude)?.to_f64()?;
        GeoPoint::new(lat, lng).ok()
    }
}

/// Iterator over the keys of one observed store state.
///
/// Holds the generation seen at creation; once a mutation bumps the
/// store's counter, `next()` yields one
/// [`GeodexError::ConcurrentModification`] and then terminates, instead
/// of walking keys from a state that no longer exists.
#[derive(Debug, Clone)]
pub struct Keys {
    keys: Vec<Key>,
    cursor: usize,
    generation: Arc<AtomicU64>,
    observed: u64,
}

impl Keys {
    /// Rewind to the first key. The observed generation is kept, so a
    /// restarted iterator over a mutated store still fails fast.
    pub fn restart(&mut self) {
        self.cursor = 0;
    }
}

impl Iterator for Keys {
    type Item = Result<Key>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.keys.len() {
            return None;
        }
        let current = self.generation.load(Ordering::SeqCst);
        if current != self.observed {
            self.cursor = self.keys.len();
            return Some(Err(GeodexError::ConcurrentModification {
                observed: self.observed,
                current,
            }));
        }
        let key = self.keys[self.cursor].clone();
        self.cursor += 1;
        Some(Ok(key))
    }
}
