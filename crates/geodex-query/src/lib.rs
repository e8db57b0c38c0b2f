//! Geodex Query - The public query surface
//!
//! Composes the record store, spatial grid and fuzzy matcher into
//! [`Geodex`], the facade external callers (CLIs, map renderers, library
//! consumers) talk to. An external loader feeds rows through
//! [`Geodex::load`]; every query returns plain key / `(distance, key)` /
//! `(score, key)` sequences, never UI structures.
//!
//! ```
//! use geodex_query::{Condition, CombineMode, Geodex};
//! use geodex_query::{CoordinateFields, FieldMap, LoadOptions, SourceRow, Value};
//!
//! let rows = vec![SourceRow::new(
//!     "ORY",
//!     FieldMap::from_iter([
//!         ("name".to_string(), Value::from("Paris-Orly")),
//!         ("lat".to_string(), Value::from("48.7262")),
//!         ("lng".to_string(), Value::from("2.3652")),
//!     ]),
//!     1,
//! )];
//! let options = LoadOptions {
//!     coordinates: Some(CoordinateFields::new("lat", "lng")),
//!     ..LoadOptions::default()
//! };
//! let (engine, report) = Geodex::load(rows, options);
//! assert_eq!(report.records_loaded, 1);
//!
//! let near = engine.find_near_point(48.84, 2.367, 40.0).unwrap();
//! assert_eq!(near[0].1.as_str(), "ORY");
//! ```

pub mod condition;
pub mod engine;

pub use condition::{CombineMode, Condition};
pub use engine::Geodex;

// The types a consumer needs alongside the facade.
pub use geodex_core::config::{DuplicatePolicy, GridConfig, MatchConfig};
pub use geodex_core::ports::{CoordinateFields, LoadOptions, LoadReport, SourceRow};
pub use geodex_core::{FieldMap, GeoPoint, GeodexError, Key, Record, ReservedField, Result, Value};
pub use geodex_match::PhoneticCode;
pub use geodex_store::Keys;
