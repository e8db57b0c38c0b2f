//! Calculations on a sphere.

use geodex_core::GeoPoint;

/// Mean Earth radius, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers spanned by one degree of a great circle.
pub const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

/// Great-circle distance between two points, in kilometers, using the
/// haversine formula. Symmetric; zero iff the points are equal.
pub fn haversine(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat().to_radians();
    let lat2 = b.lat().to_radians();
    let dlat = (b.lat() - a.lat()).to_radians();
    let dlng = (b.lng() - a.lng()).to_radians();

    let h = (0.5 * dlat).sin().powi(2) + (0.5 * dlng).sin().powi(2) * lat1.cos() * lat2.cos();

    // h can drift a hair above 1.0 for antipodal points
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}
