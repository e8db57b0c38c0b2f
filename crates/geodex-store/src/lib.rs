//! Geodex Store - The record store and its derived field index
//!
//! [`RecordStore`] owns every loaded record in insertion order, applies
//! the duplicate-key policy, and maintains the field index conditional
//! queries run against. Every mutation bumps a generation counter that
//! derived structures (the spatial grid, live key iterators) compare
//! against to detect staleness.

pub mod field_index;
pub mod store;

pub use field_index::FieldIndex;
pub use store::{Keys, RecordStore};
