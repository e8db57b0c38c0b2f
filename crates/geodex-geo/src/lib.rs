//! Geodex Geo - Great-circle distance, geohash cells, and the grid index
//!
//! The spatial side of geodex: a haversine distance function, a
//! bit-interleaved geohash codec, and [`GeoGrid`], an immutable
//! generation-tagged snapshot index answering radius and k-nearest
//! queries without full scans in the common case.

pub mod cell;
pub mod geodesy;
pub mod grid;

pub use geodesy::{haversine, EARTH_RADIUS_KM};
pub use grid::GeoGrid;
