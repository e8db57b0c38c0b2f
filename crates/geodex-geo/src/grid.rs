//! The grid spatial index.
//!
//! [`GeoGrid`] buckets indexed points into geohash cells at a fixed
//! precision and answers radius and k-nearest queries by expanding rings
//! of neighbor cells around the query point, then filtering candidates by
//! exact haversine distance. A grid is an immutable snapshot tagged with
//! the store generation it was built from; rebuilding produces a fresh
//! snapshot instead of mutating cells in place.

use crate::cell::{encode, neighbors, spans};
use crate::geodesy::{haversine, EARTH_RADIUS_KM, KM_PER_DEGREE};
use geodex_core::{GeoPoint, Key};
use std::collections::{BTreeSet, HashMap};

/// Ring growth cap; past this the grid gives up and scans exhaustively.
const MAX_RINGS: usize = 48;

/// Latitude beyond which longitude cell widths degenerate and ring
/// coverage can no longer be proven.
const MAX_GRID_LAT: f64 = 88.0;

#[derive(Debug, Clone)]
struct IndexedPoint {
    point: GeoPoint,
    cell: String,
}

/// Geohash grid over the geo-tagged records of one store generation.
#[derive(Debug, Clone)]
pub struct GeoGrid {
    precision: u8,
    generation: u64,
    cells: HashMap<String, Vec<Key>>,
    points: HashMap<Key, IndexedPoint>,
}

impl GeoGrid {
    /// Build a snapshot from `(key, point)` entries. Entries are expected
    /// pre-validated; records without a usable point never reach the grid.
    pub fn build(
        precision: u8,
        generation: u64,
        entries: impl IntoIterator<Item = (Key, GeoPoint)>,
    ) -> Self {
        let mut cells: HashMap<String, Vec<Key>> = HashMap::new();
        let mut points = HashMap::new();

        for (key, point) in entries {
            let cell = encode(point, precision);
            cells.entry(cell.clone()).or_default().push(key.clone());
            points.insert(key, IndexedPoint { point, cell });
        }

        tracing::debug!(
            precision,
            generation,
            points = points.len(),
            cells = cells.len(),
            "built spatial grid snapshot"
        );

        Self { precision, generation, cells, points }
    }

    pub fn empty(precision: u8, generation: u64) -> Self {
        Self::build(precision, generation, std::iter::empty())
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Store generation this snapshot was built from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of indexed (geo-tagged) keys.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.points.contains_key(key)
    }

    pub fn position(&self, key: &Key) -> Option<GeoPoint> {
        self.points.get(key).map(|entry| entry.point)
    }

    /// Cell id of an indexed key.
    pub fn cell_of(&self, key: &Key) -> Option<&str> {
        self.points.get(key).map(|entry| entry.cell.as_str())
    }

    /// All keys within `radius_km` of `origin`, with their exact
    /// distances. Exhaustive and exact: candidate cells are expanded wide
    /// enough that no boundary effect can hide a match, and every
    /// candidate is checked against the true haversine distance. The
    /// result is unordered; rank with [`rank_by_distance`] if needed.
    ///
    /// A non-positive radius matches only points coincident with `origin`.
    pub fn radius_search(&self, origin: GeoPoint, radius_km: f64) -> Vec<(f64, Key)> {
        if self.points.is_empty() {
            return Vec::new();
        }
        let radius_km = radius_km.max(0.0);

        let Some(rings) = self.ring_budget(origin, radius_km) else {
            return self.scan_within(origin, radius_km);
        };

        let mut out = Vec::new();
        let mut frontier = BTreeSet::from([encode(origin, self.precision)]);
        let mut interior = frontier.clone();

        for _ in 0..rings {
            for cell_id in &frontier {
                if let Some(keys) = self.cells.get(cell_id) {
                    for key in keys {
                        let dist = haversine(origin, self.points[key].point);
                        if dist <= radius_km {
                            out.push((dist, key.clone()));
                        }
                    }
                }
            }
            frontier = grow(&frontier, &mut interior);
            if frontier.is_empty() {
                break;
            }
        }

        out
    }

    /// The `n` keys closest to `origin`, sorted ascending by distance,
    /// ties broken by key. Expands rings until the n-th best candidate is
    /// provably closer than anything an unexamined cell could hold.
    pub fn k_nearest(&self, origin: GeoPoint, n: usize) -> Vec<(f64, Key)> {
        if n == 0 || self.points.is_empty() {
            return Vec::new();
        }
        let want = n.min(self.points.len());
        let (lat_span, _) = spans(self.precision);

        let mut candidates: Vec<(f64, Key)> = Vec::new();
        let mut frontier = BTreeSet::from([encode(origin, self.precision)]);
        let mut interior = frontier.clone();
        let mut ring = 0usize;

        loop {
            for cell_id in &frontier {
                if let Some(keys) = self.cells.get(cell_id) {
                    for key in keys {
                        candidates.push((haversine(origin, self.points[key].point), key.clone()));
                    }
                }
            }

            if candidates.len() == self.points.len() {
                break;
            }

            // Worst latitude any point in the nearest unexamined cell
            // can have.
            let reach = origin.lat().abs() + (ring as f64 + 2.0) * lat_span;
            if reach > MAX_GRID_LAT || ring >= MAX_RINGS {
                tracing::warn!(
                    lat = origin.lat(),
                    ring,
                    "ring expansion degenerated, scanning all indexed points"
                );
                candidates = self.distances_to_all(origin);
                break;
            }

            if candidates.len() >= want {
                rank_by_distance(&mut candidates);
                // Any unexamined cell lies at least `ring` whole cells away.
                let covered_km = self.ring_floor_km(ring, reach);
                if candidates[want - 1].0 <= covered_km {
                    break;
                }
            }

            frontier = grow(&frontier, &mut interior);
            if frontier.is_empty() {
                break;
            }
            ring += 1;
        }

        rank_by_distance(&mut candidates);
        candidates.truncate(want);
        candidates
    }

    /// Rings needed so every point within `radius_km` of `origin` falls in
    /// an examined cell; `None` when coverage cannot be proven and the
    /// caller must scan.
    fn ring_budget(&self, origin: GeoPoint, radius_km: f64) -> Option<usize> {
        let (lat_span, lng_span) = spans(self.precision);
        let lat_reach = radius_km / KM_PER_DEGREE;
        let worst_lat = origin.lat().abs() + lat_reach + lat_span;
        if worst_lat > MAX_GRID_LAT {
            return None;
        }
        // Longitude reach of an in-range point, from the haversine bound
        // sin(d / 2R) >= cos(lat) * sin(dlng / 2). The linear span
        // estimate undercounts at high latitudes.
        let sin_half = (radius_km / (2.0 * EARTH_RADIUS_KM)).sin() / worst_lat.to_radians().cos();
        if sin_half >= 1.0 {
            return None;
        }
        let lng_reach = 2.0 * sin_half.asin().to_degrees();
        let rings_lat = (lat_reach / lat_span).ceil() as usize;
        let rings_lng = (lng_reach / lng_span).ceil() as usize;
        let rings = rings_lat.max(rings_lng) + 2;
        (rings <= MAX_RINGS).then_some(rings)
    }

    /// Lower bound on the distance from the origin to any point lying at
    /// least `rings` whole cells away, with `worst_lat` bounding the
    /// latitudes involved.
    fn ring_floor_km(&self, rings: usize, worst_lat: f64) -> f64 {
        let (lat_span, lng_span) = spans(self.precision);
        let lat_km = rings as f64 * lat_span * KM_PER_DEGREE;
        let half_lng =
            ((rings as f64 * lng_span).to_radians() / 2.0).min(std::f64::consts::FRAC_PI_2);
        let lng_km =
            2.0 * EARTH_RADIUS_KM * (worst_lat.to_radians().cos() * half_lng.sin()).asin();
        lat_km.min(lng_km)
    }

    fn distances_to_all(&self, origin: GeoPoint) -> Vec<(f64, Key)> {
        self.points
            .iter()
            .map(|(key, entry)| (haversine(origin, entry.point), key.clone()))
            .collect()
    }

    fn scan_within(&self, origin: GeoPoint, radius_km: f64) -> Vec<(f64, Key)> {
        tracing::warn!(
            lat = origin.lat(),
            radius_km,
            "ring expansion degenerated, scanning all indexed points"
        );
        self.distances_to_all(origin)
            .into_iter()
            .filter(|(dist, _)| *dist <= radius_km)
            .collect()
    }
}

/// Sort `(distance, key)` results ascending by distance, ties broken by
/// key ordering for determinism.
pub fn rank_by_distance(results: &mut [(f64, Key)]) {
    results.sort_by(|a, b| {
        a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.1.cmp(&b.1))
    });
}

/// One frontier step: all unvisited neighbors of the current frontier.
fn grow(frontier: &BTreeSet<String>, interior: &mut BTreeSet<String>) -> BTreeSet<String> {
    let mut next = BTreeSet::new();
    for cell_id in frontier {
        for neighbor in neighbors(cell_id) {
            if !interior.contains(&neighbor) {
                next.insert(neighbor);
            }
        }
    }
    interior.extend(next.iter().cloned());
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    fn paris_airports() -> Vec<(Key, GeoPoint)> {
        vec![
            (Key::from("ORY"), point(48.7262, 2.3652)),
            (Key::from("CDG"), point(49.0097, 2.5479)),
            (Key::from("LBG"), point(48.9694, 2.4414)),
            (Key::from("TNF"), point(48.7233, 2.1125)),
        ]
    }

    #[test]
    fn test_frontier_growth_is_square() {
        // Rings around an interior cell cover (2n-1)^2 cells in total.
        let mut frontier = BTreeSet::from([String::from("t0dbr")]);
        let mut interior = frontier.clone();
        let mut total = frontier.len();
        for expected in [9, 25, 49, 81] {
            frontier = grow(&frontier, &mut interior);
            total += frontier.len();
            assert_eq!(total, expected);
        }
    }

    #[test]
    fn test_radius_search_paris() {
        let grid = GeoGrid::build(5, 0, paris_airports());
        let mut found = grid.radius_search(point(48.84, 2.367), 40.0);
        rank_by_distance(&mut found);

        let keys: Vec<&str> = found.iter().map(|(_, k)| k.as_str()).collect();
        assert_eq!(keys, vec!["ORY", "LBG", "TNF", "CDG"]);
        assert!((found[0].0 - 12.6).abs() < 0.3, "ORY was {} km", found[0].0);
        for window in found.windows(2) {
            assert!(window[0].0 <= window[1].0);
        }
        assert!(found.iter().all(|(d, _)| *d <= 40.0));
    }

    #[test]
    fn test_radius_search_cutoff() {
        let grid = GeoGrid::build(5, 0, paris_airports());
        // 20 km keeps only Orly and Le Bourget.
        let found = grid.radius_search(point(48.84, 2.367), 20.0);
        let keys: BTreeSet<&str> = found.iter().map(|(_, k)| k.as_str()).collect();
        assert_eq!(keys, BTreeSet::from(["ORY", "LBG"]));
    }

    #[test]
    fn test_radius_search_is_monotonic() {
        let grid = GeoGrid::build(5, 0, paris_airports());
        let origin = point(48.84, 2.367);
        let mut previous: BTreeSet<String> = BTreeSet::new();
        for radius in [0.0, 5.0, 13.0, 16.0, 23.0, 40.0, 500.0] {
            let found: BTreeSet<String> = grid
                .radius_search(origin, radius)
                .into_iter()
                .map(|(_, k)| k.to_string())
                .collect();
            assert!(previous.is_subset(&found), "radius {radius} lost results");
            previous = found;
        }
    }

    #[test]
    fn test_radius_zero_matches_only_coincident() {
        let mut entries = paris_airports();
        entries.push((Key::from("HERE"), point(48.84, 2.367)));
        let grid = GeoGrid::build(5, 0, entries);

        let found = grid.radius_search(point(48.84, 2.367), 0.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, 0.0);
        assert_eq!(found[0].1.as_str(), "HERE");

        // Negative radius behaves like zero.
        let found = grid.radius_search(point(48.84, 2.367), -3.0);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_radius_search_across_cell_boundary() {
        // 2.373046875 is a longitude cell edge at precision 5; the two
        // points sit a few dozen meters apart on opposite sides of it.
        let west = point(48.7, 2.3728);
        let east = point(48.7, 2.3733);
        assert_ne!(encode(west, 5), encode(east, 5));

        let grid =
            GeoGrid::build(5, 0, vec![(Key::from("W"), west), (Key::from("E"), east)]);
        let found = grid.radius_search(west, 0.5);
        let keys: BTreeSet<&str> = found.iter().map(|(_, k)| k.as_str()).collect();
        assert_eq!(keys, BTreeSet::from(["W", "E"]));
    }

    #[test]
    fn test_empty_grid_never_errors() {
        let grid = GeoGrid::empty(5, 0);
        assert!(grid.is_empty());
        assert!(grid.radius_search(point(0.0, 0.0), 100.0).is_empty());
        assert!(grid.k_nearest(point(0.0, 0.0), 3).is_empty());
    }

    #[test]
    fn test_k_nearest_two_stations() {
        let grid = GeoGrid::build(
            5,
            0,
            vec![
                (Key::from("ORY"), point(48.72, 2.359)),
                (Key::from("CDG"), point(48.75, 2.361)),
            ],
        );
        let found = grid.k_nearest(point(48.75, 2.361), 2);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].1.as_str(), "CDG");
        assert_eq!(found[0].0, 0.0);
        assert_eq!(found[1].1.as_str(), "ORY");
        assert!((found[1].0 - 3.33).abs() < 0.05, "was {} km", found[1].0);
    }

    #[test]
    fn test_k_nearest_zero_and_overshoot() {
        let grid = GeoGrid::build(5, 0, paris_airports());
        assert!(grid.k_nearest(point(48.84, 2.367), 0).is_empty());
        let all = grid.k_nearest(point(48.84, 2.367), 50);
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_k_nearest_ties_break_by_key() {
        let grid = GeoGrid::build(
            4,
            0,
            vec![
                (Key::from("B"), point(0.0, 1.0)),
                (Key::from("A"), point(0.0, -1.0)),
            ],
        );
        let found = grid.k_nearest(point(0.0, 0.0), 2);
        assert_eq!(found[0].1.as_str(), "A");
        assert_eq!(found[1].1.as_str(), "B");
        assert!((found[0].0 - found[1].0).abs() < 1e-9);
    }

    #[test]
    fn test_k_nearest_reaches_past_empty_rings() {
        // Nearest point lives several rings out; the expansion must keep
        // going through empty cells until the bound is provable.
        let grid = GeoGrid::build(
            5,
            0,
            vec![
                (Key::from("NEAR"), point(48.7, 2.55)),  // ~13 km east
                (Key::from("FAR"), point(49.0, 2.367)),  // ~33 km north
            ],
        );
        let found = grid.k_nearest(point(48.7, 2.367), 1);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1.as_str(), "NEAR");
    }

    #[test]
    fn test_polar_query_falls_back_to_scan() {
        let grid = GeoGrid::build(
            5,
            0,
            vec![
                (Key::from("ALERT"), point(82.5018, -62.3481)),
                (Key::from("EUREKA"), point(79.9833, -85.9333)),
            ],
        );
        // Past the proving threshold the grid scans; results stay exact.
        let found = grid.radius_search(point(89.5, 0.0), 2000.0);
        let keys: BTreeSet<&str> = found.iter().map(|(_, k)| k.as_str()).collect();
        assert_eq!(keys, BTreeSet::from(["ALERT", "EUREKA"]));

        let nearest = grid.k_nearest(point(89.5, 0.0), 1);
        assert_eq!(nearest[0].1.as_str(), "ALERT");
    }

    #[test]
    fn test_snapshot_metadata() {
        let grid = GeoGrid::build(5, 7, paris_airports());
        assert_eq!(grid.generation(), 7);
        assert_eq!(grid.precision(), 5);
        assert_eq!(grid.len(), 4);
        assert!(grid.contains(&Key::from("ORY")));
        assert_eq!(grid.cell_of(&Key::from("ORY")), Some("u09tj"));
        assert!(grid.position(&Key::from("XXX")).is_none());
    }
}
