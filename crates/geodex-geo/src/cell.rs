//! Geohash cells: a bit-interleaved base32 encoding of latitude/longitude.
//!
//! A cell id is a string prefix; all points sharing a prefix of length
//! `precision` fall in the same rectangular bucket. Longitude takes the
//! even bits, latitude the odd ones, so cells at a given precision tile
//! the globe in a uniform degree grid — which is what makes the
//! neighbor-ring searches in [`crate::grid`] exact.

use geodex_core::config::GridConfig;
use geodex_core::GeoPoint;

const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Hash lengths outside this range are never useful: one character covers
/// a continent, twelve is sub-centimeter.
pub const MIN_PRECISION: u8 = 1;
pub const MAX_PRECISION: u8 = 12;

/// Default hash length when neither a precision nor a radius is
/// configured; one cell spans roughly 2.4 km.
pub const DEFAULT_PRECISION: u8 = 5;

/// Approximate km spanned by one cell at each precision, coarsest first.
const CELL_SPAN_KM: [(u8, f64); 8] = [
    (1, 2500.0),
    (2, 630.0),
    (3, 78.0),
    (4, 20.0),
    (5, 2.4),
    (6, 0.61),
    (7, 0.076),
    (8, 0.019),
];

/// Encode a point to its cell id at the given precision.
pub fn encode(point: GeoPoint, precision: u8) -> String {
    let precision = precision.clamp(MIN_PRECISION, MAX_PRECISION) as usize;
    let (mut lat_lo, mut lat_hi) = (-90.0_f64, 90.0_f64);
    let (mut lng_lo, mut lng_hi) = (-180.0_f64, 180.0_f64);

    let mut out = String::with_capacity(precision);
    let mut bits = 0u8;
    let mut ch = 0usize;
    let mut even = true; // even bits refine longitude

    while out.len() < precision {
        if even {
            let mid = 0.5 * (lng_lo + lng_hi);
            if point.lng() >= mid {
                ch = (ch << 1) | 1;
                lng_lo = mid;
            } else {
                ch <<= 1;
                lng_hi = mid;
            }
        } else {
            let mid = 0.5 * (lat_lo + lat_hi);
            if point.lat() >= mid {
                ch = (ch << 1) | 1;
                lat_lo = mid;
            } else {
                ch <<= 1;
                lat_hi = mid;
            }
        }
        even = !even;
        bits += 1;
        if bits == 5 {
            out.push(BASE32[ch] as char);
            bits = 0;
            ch = 0;
        }
    }

    out
}

/// Bounding box of a cell: `(lat_lo, lat_hi, lng_lo, lng_hi)` in degrees.
///
/// Returns `None` when the id contains a character outside the geohash
/// alphabet.
pub fn bounds(cell: &str) -> Option<(f64, f64, f64, f64)> {
    let (mut lat_lo, mut lat_hi) = (-90.0_f64, 90.0_f64);
    let (mut lng_lo, mut lng_hi) = (-180.0_f64, 180.0_f64);
    let mut even = true;

    for c in cell.bytes() {
        let digit = BASE32.iter().position(|&b| b == c.to_ascii_lowercase())?;
        for shift in (0..5).rev() {
            let bit = (digit >> shift) & 1;
            if even {
                let mid = 0.5 * (lng_lo + lng_hi);
                if bit == 1 {
                    lng_lo = mid;
                } else {
                    lng_hi = mid;
                }
            } else {
                let mid = 0.5 * (lat_lo + lat_hi);
                if bit == 1 {
                    lat_lo = mid;
                } else {
                    lat_hi = mid;
                }
            }
            even = !even;
        }
    }

    Some((lat_lo, lat_hi, lng_lo, lng_hi))
}

/// Degree span of one cell at a precision: `(lat_span, lng_span)`.
pub fn spans(precision: u8) -> (f64, f64) {
    let total_bits = 5 * precision as u32;
    let lng_bits = total_bits.div_ceil(2);
    let lat_bits = total_bits / 2;
    (180.0 / (1u64 << lat_bits) as f64, 360.0 / (1u64 << lng_bits) as f64)
}

/// The up-to-eight adjacent cells of a cell, skipping the rows beyond the
/// poles and wrapping across the antimeridian.
pub fn neighbors(cell: &str) -> Vec<String> {
    let Some((lat_lo, lat_hi, lng_lo, lng_hi)) = bounds(cell) else {
        return Vec::new();
    };
    let precision = cell.len() as u8;
    let lat_span = lat_hi - lat_lo;
    let lng_span = lng_hi - lng_lo;
    let center_lat = 0.5 * (lat_lo + lat_hi);
    let center_lng = 0.5 * (lng_lo + lng_hi);

    let mut out = Vec::with_capacity(8);
    for di in [-1.0_f64, 0.0, 1.0] {
        for dj in [-1.0_f64, 0.0, 1.0] {
            if di == 0.0 && dj == 0.0 {
                continue;
            }
            let lat = center_lat + di * lat_span;
            if !(-90.0..=90.0).contains(&lat) {
                continue;
            }
            let mut lng = center_lng + dj * lng_span;
            if lng >= 180.0 {
                lng -= 360.0;
            } else if lng < -180.0 {
                lng += 360.0;
            }
            let Ok(point) = GeoPoint::new(lat, lng) else {
                continue;
            };
            let id = encode(point, precision);
            if id != cell && !out.contains(&id) {
                out.push(id);
            }
        }
    }

    out
}

/// Resolve a grid configuration to a hash length.
///
/// An explicit precision wins; otherwise the precision whose cell spans
/// roughly the configured radius is picked (preferring the cell at least
/// as large as the radius, closest to it).
pub fn resolve_precision(config: &GridConfig) -> u8 {
    if let Some(precision) = config.precision {
        return precision.clamp(MIN_PRECISION, MAX_PRECISION);
    }
    match config.radius_km {
        Some(radius) => precision_for_radius(radius),
        None => DEFAULT_PRECISION,
    }
}

fn precision_for_radius(radius_km: f64) -> u8 {
    let mut best: Option<(bool, f64, u8)> = None;
    for &(precision, span_km) in &CELL_SPAN_KM {
        let candidate = (span_km < radius_km, (radius_km - span_km).abs(), precision);
        let better = match best {
            None => true,
            Some((too_small, diff, _)) => {
                (candidate.0, candidate.1) < (too_small, diff)
            }
        };
        if better {
            best = Some(candidate);
        }
    }
    best.map(|(_, _, p)| p).unwrap_or(DEFAULT_PRECISION)
}
