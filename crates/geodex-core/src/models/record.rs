use crate::models::{GeoPoint, Key, Value};
use serde::{Deserialize, Serialize};

/// Reserved per-record data kept outside the regular field map.
///
/// The original data sources mark these with `__dup__`-style sentinel
/// names; geodex models them as a closed enum and translates the sentinel
/// spellings once, at the load boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservedField {
    /// Keys derived from this record by the duplicate policy.
    Duplicates,
    /// Keys this record was derived from.
    Parents,
    /// Line number of the source row.
    LineNumber,
    /// Cells the loader could not attribute to a declared field.
    Garbage,
}

impl ReservedField {
    pub const ALL: [ReservedField; 4] = [
        ReservedField::Duplicates,
        ReservedField::Parents,
        ReservedField::LineNumber,
        ReservedField::Garbage,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReservedField::Duplicates => "duplicates",
            ReservedField::Parents => "parents",
            ReservedField::LineNumber => "line_number",
            ReservedField::Garbage => "garbage",
        }
    }

    /// Translation table used at the load boundary. Accepts both the
    /// canonical names and the sentinel spellings of legacy sources.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "duplicates" | "__dup__" => Some(ReservedField::Duplicates),
            "parents" | "__par__" => Some(ReservedField::Parents),
            "line_number" | "__lno__" => Some(ReservedField::LineNumber),
            "garbage" | "__gar__" => Some(ReservedField::Garbage),
            _ => None,
        }
    }
}

/// An insertion-ordered field → value map.
///
/// Records carry a handful of fields; a plain vector keeps the source
/// column order, which `HashMap` would lose and `BTreeMap` would re-sort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMap {
    entries: Vec<(String, Value)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Insert or replace a value. A replaced field keeps its position;
    /// a new field is appended. Returns the previous value, if any.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

/// One loaded row: a unique key, its ordered fields, and reserved data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    key: Key,
    fields: FieldMap,
    point: Option<GeoPoint>,
    duplicates: Vec<Key>,
    parents: Vec<Key>,
    line_number: u64,
    garbage: Vec<String>,
}

impl Record {
    pub fn new(key: Key, fields: FieldMap, line_number: u64) -> Self {
        Self {
            key,
            fields,
            point: None,
            duplicates: Vec::new(),
            parents: Vec::new(),
            line_number,
            garbage: Vec::new(),
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The record's resolved geographic point, if its coordinate fields
    /// parsed to a valid latitude/longitude pair.
    pub fn point(&self) -> Option<GeoPoint> {
        self.point
    }

    pub fn duplicates(&self) -> &[Key] {
        &self.duplicates
    }

    pub fn parents(&self) -> &[Key] {
        &self.parents
    }

    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    pub fn garbage(&self) -> &[String] {
        &self.garbage
    }

    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }

    /// Whether this record was minted by the duplicate policy rather than
    /// loaded under its own key.
    pub fn is_derived(&self) -> bool {
        !self.parents.is_empty()
    }

    /// Reserved data rendered as a regular value, for display tables.
    pub fn reserved(&self, field: ReservedField) -> Value {
        match field {
            ReservedField::Duplicates => {
                Value::List(self.duplicates.iter().map(|k| k.as_str().to_string()).collect())
            }
            ReservedField::Parents => {
                Value::List(self.parents.iter().map(|k| k.as_str().to_string()).collect())
            }
            ReservedField::LineNumber => Value::Number(self.line_number as f64),
            ReservedField::Garbage => Value::List(self.garbage.clone()),
        }
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name, value)
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn set_point(&mut self, point: Option<GeoPoint>) {
        self.point = point;
    }

    pub fn link_duplicate(&mut self, derived: Key) {
        self.duplicates.push(derived);
    }

    pub fn link_parent(&mut self, parent: Key) {
        self.parents.push(parent);
    }

    pub fn push_garbage(&mut self, cell: String) {
        self.garbage.push(cell);
    }
}
