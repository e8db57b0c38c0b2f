//! Geodex Core - Domain models, configuration, and loader ports
//!
//! This crate contains the domain types shared by every other geodex crate:
//! records and their reserved data, validated geographic points, the error
//! type, and the narrow interface external loaders feed rows through.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use error::{GeodexError, Result};
pub use models::{FieldMap, GeoPoint, Key, Record, ReservedField, Value};
