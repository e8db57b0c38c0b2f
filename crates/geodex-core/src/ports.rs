//! The narrow interface between external loaders and the engine.
//!
//! Parsing (CSV, YAML, whatever the data source speaks) happens outside
//! geodex. A loader delivers a finite sequence of [`SourceRow`]s with
//! sub-delimited cells already resolved to lists, plus [`LoadOptions`]
//! declaring which two fields carry the coordinates. Malformed rows never
//! abort a load; they are tallied in the returned [`LoadReport`], because
//! partial, imperfect reference data is the normal case in this domain.

use crate::config::{DuplicatePolicy, GridConfig, MatchConfig};
use crate::models::{FieldMap, Key};
use serde::{Deserialize, Serialize};

/// One row handed over by an external loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRow {
    /// `None` when the loader could not build a key for the row.
    pub key: Option<Key>,
    pub fields: FieldMap,
    pub line_number: u64,
}

impl SourceRow {
    pub fn new(key: impl Into<Key>, fields: FieldMap, line_number: u64) -> Self {
        Self { key: Some(key.into()), fields, line_number }
    }

    pub fn without_key(fields: FieldMap, line_number: u64) -> Self {
        Self { key: None, fields, line_number }
    }
}

/// The two field names a record's geographic point is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateFields {
    pub latitude: String,
    pub longitude: String,
}

impl CoordinateFields {
    pub fn new(latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        Self { latitude: latitude.into(), longitude: longitude.into() }
    }
}

/// Everything a load needs besides the rows themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// `None` for datasets with no geographic component; such a store
    /// still answers exact, conditional and fuzzy queries.
    pub coordinates: Option<CoordinateFields>,
    pub duplicate_policy: DuplicatePolicy,
    pub grid: GridConfig,
    pub matching: MatchConfig,
}

/// Summary of one load. Returned, never thrown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub records_loaded: usize,
    pub duplicates_renamed: usize,
    pub duplicates_discarded: usize,
    pub rows_without_key: usize,
    /// Records whose coordinate fields were missing or unparsable; they
    /// stay in the store but are invisible to spatial queries.
    pub records_without_point: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    #[test]
    fn test_source_row_constructors() {
        let fields = FieldMap::from_iter([("name".to_string(), Value::from("Orly"))]);
        let keyed = SourceRow::new("ORY", fields.clone(), 3);
        assert_eq!(keyed.key, Some(Key::from("ORY")));

        let unkeyed = SourceRow::without_key(fields, 4);
        assert_eq!(unkeyed.key, None);
        assert_eq!(unkeyed.line_number, 4);
    }
}
