//! Property tests for the grid index and the distance function.
//!
//! The grid must agree exactly with an exhaustive haversine scan for any
//! point set, origin, and radius — including points sitting right on cell
//! boundaries, which random sampling exercises far better than
//! hand-picked fixtures.

use geodex_core::{GeoPoint, Key};
use geodex_geo::grid::{rank_by_distance, GeoGrid};
use geodex_geo::haversine;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn coord() -> impl Strategy<Value = (f64, f64)> {
    // Wide mid-latitude band; polar degeneracy has its own unit tests.
    (-60.0..60.0f64, -179.0..179.0f64)
}

fn keyed_points(max: usize) -> impl Strategy<Value = Vec<(Key, GeoPoint)>> {
    prop::collection::vec(coord(), 1..max).prop_map(|coords| {
        coords
            .into_iter()
            .enumerate()
            .map(|(i, (lat, lng))| {
                (Key::from(format!("P{i:02}")), GeoPoint::new(lat, lng).unwrap())
            })
            .collect()
    })
}

fn exhaustive_within(
    entries: &[(Key, GeoPoint)],
    origin: GeoPoint,
    radius_km: f64,
) -> BTreeSet<String> {
    entries
        .iter()
        .filter(|(_, p)| haversine(origin, *p) <= radius_km)
        .map(|(k, _)| k.to_string())
        .collect()
}

proptest! {
    #[test]
    fn radius_search_matches_exhaustive_scan(
        entries in keyed_points(24),
        (olat, olng) in coord(),
        radius_km in 0.0..800.0f64,
        precision in 3u8..7,
    ) {
        let origin = GeoPoint::new(olat, olng).unwrap();
        let grid = GeoGrid::build(precision, 0, entries.clone());

        let found: BTreeSet<String> = grid
            .radius_search(origin, radius_km)
            .into_iter()
            .map(|(_, k)| k.to_string())
            .collect();

        prop_assert_eq!(found, exhaustive_within(&entries, origin, radius_km));
    }

    #[test]
    fn radius_search_is_monotonic_in_radius(
        entries in keyed_points(16),
        (olat, olng) in coord(),
        r1 in 0.0..400.0f64,
        extra in 0.0..400.0f64,
    ) {
        let origin = GeoPoint::new(olat, olng).unwrap();
        let grid = GeoGrid::build(5, 0, entries);

        let small: BTreeSet<String> = grid
            .radius_search(origin, r1)
            .into_iter()
            .map(|(_, k)| k.to_string())
            .collect();
        let large: BTreeSet<String> = grid
            .radius_search(origin, r1 + extra)
            .into_iter()
            .map(|(_, k)| k.to_string())
            .collect();

        prop_assert!(small.is_subset(&large));
    }

    #[test]
    fn k_nearest_matches_exhaustive_ranking(
        entries in keyed_points(20),
        (olat, olng) in coord(),
        n in 0usize..24,
        precision in 3u8..7,
    ) {
        let origin = GeoPoint::new(olat, olng).unwrap();
        let grid = GeoGrid::build(precision, 0, entries.clone());

        let found = grid.k_nearest(origin, n);

        let mut expected: Vec<(f64, Key)> = entries
            .iter()
            .map(|(k, p)| (haversine(origin, *p), k.clone()))
            .collect();
        rank_by_distance(&mut expected);
        expected.truncate(n.min(entries.len()));

        prop_assert_eq!(found.len(), expected.len());
        for (got, want) in found.iter().zip(expected.iter()) {
            prop_assert_eq!(&got.1, &want.1);
            prop_assert_eq!(got.0, want.0);
        }
    }

    #[test]
    fn haversine_is_symmetric_and_zero_on_identity(
        (lat1, lng1) in coord(),
        (lat2, lng2) in coord(),
    ) {
        let a = GeoPoint::new(lat1, lng1).unwrap();
        let b = GeoPoint::new(lat2, lng2).unwrap();
        prop_assert_eq!(haversine(a, b), haversine(b, a));
        prop_assert_eq!(haversine(a, a), 0.0);
        prop_assert!(haversine(a, b) >= 0.0);
    }

    #[test]
    fn haversine_satisfies_triangle_inequality(
        (lat1, lng1) in coord(),
        (lat2, lng2) in coord(),
        (lat3, lng3) in coord(),
    ) {
        let a = GeoPoint::new(lat1, lng1).unwrap();
        let b = GeoPoint::new(lat2, lng2).unwrap();
        let c = GeoPoint::new(lat3, lng3).unwrap();
        let slack = 1e-6;
        prop_assert!(haversine(a, c) <= haversine(a, b) + haversine(b, c) + slack);
    }
}
