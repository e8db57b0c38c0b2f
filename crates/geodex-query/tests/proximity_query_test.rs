//! Proximity queries through the facade: radius search, k-nearest,
//! key-anchored variants and pairwise distance.

use geodex_query::{
    CoordinateFields, FieldMap, Geodex, GeodexError, LoadOptions, SourceRow, Value,
};

fn airport(key: &str, name: &str, lat: &str, lng: &str, line: u64) -> SourceRow {
    SourceRow::new(
        key,
        FieldMap::from_iter([
            ("name".to_string(), Value::from(name)),
            ("lat".to_string(), Value::from(lat)),
            ("lng".to_string(), Value::from(lng)),
        ]),
        line,
    )
}

fn geo_options() -> LoadOptions {
    LoadOptions {
        coordinates: Some(CoordinateFields::new("lat", "lng")),
        ..LoadOptions::default()
    }
}

fn paris_engine() -> Geodex {
    let rows = vec![
        airport("ORY", "Paris-Orly", "48.725278", "2.359444", 1),
        airport("CDG", "Paris - Charles-de-Gaulle", "49.012779", "2.55", 2),
        airport("LBG", "Paris-Le Bourget", "48.9694", "2.4414", 3),
        airport("TNF", "Toussus-le-Noble", "48.7233", "2.1125", 4),
        airport("NCE", "Nice-Côte d'Azur", "43.6584", "7.2159", 5),
    ];
    let (engine, report) = Geodex::load(rows, geo_options());
    assert_eq!(report.records_loaded, 5);
    assert_eq!(report.records_without_point, 0);
    engine
}

#[test]
fn test_find_near_point_forty_km() {
    let engine = paris_engine();
    let found = engine.find_near_point(48.84, 2.367, 40.0).unwrap();

    let keys: Vec<&str> = found.iter().map(|(_, k)| k.as_str()).collect();
    assert_eq!(keys, vec!["ORY", "LBG", "TNF", "CDG"]);

    assert!((found[0].0 - 12.6).abs() < 0.3, "ORY was {} km", found[0].0);
    for window in found.windows(2) {
        assert!(window[0].0 <= window[1].0);
    }
    assert!(found.iter().all(|(d, _)| *d <= 40.0));
}

#[test]
fn test_find_near_point_tighter_cutoff() {
    let engine = paris_engine();
    let found = engine.find_near_point(48.84, 2.367, 20.0).unwrap();
    let keys: Vec<&str> = found.iter().map(|(_, k)| k.as_str()).collect();
    assert_eq!(keys, vec!["ORY", "LBG"]);
}

#[test]
fn test_find_near_point_rejects_invalid_point() {
    let engine = paris_engine();
    assert!(matches!(
        engine.find_near_point(91.0, 0.0, 10.0),
        Err(GeodexError::InvalidCoordinate { .. })
    ));
    assert!(matches!(
        engine.find_near_point(0.0, -200.0, 10.0),
        Err(GeodexError::InvalidCoordinate { .. })
    ));
}

#[test]
fn test_radius_zero_matches_only_coincident() {
    let engine = paris_engine();
    let found = engine.find_near_point(48.725278, 2.359444, 0.0).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].1.as_str(), "ORY");
    assert_eq!(found[0].0, 0.0);
}

#[test]
fn test_find_near_key_excluding_self() {
    let engine = paris_engine();
    let found = engine.find_near_key("ORY", 30.0, false).unwrap();
    let keys: Vec<&str> = found.iter().map(|(_, k)| k.as_str()).collect();
    // TNF is ~18.1 km from Orly, Le Bourget ~27.8; Roissy is past 30 km.
    assert_eq!(keys, vec!["TNF", "LBG"]);
}

#[test]
fn test_find_near_key_including_self() {
    let engine = paris_engine();
    let found = engine.find_near_key("ORY", 30.0, true).unwrap();
    assert_eq!(found[0].1.as_str(), "ORY");
    assert_eq!(found[0].0, 0.0);
    assert_eq!(found.len(), 3);
}

#[test]
fn test_find_near_key_errors() {
    let engine = paris_engine();
    assert!(matches!(
        engine.find_near_key("XXX", 10.0, true),
        Err(GeodexError::NotFound { .. })
    ));

    let (engine, _) = Geodex::load(
        vec![airport("BAD", "Nowhere", "not-a-latitude", "2.0", 1)],
        geo_options(),
    );
    assert!(matches!(
        engine.find_near_key("BAD", 10.0, true),
        Err(GeodexError::MissingCoordinate { .. })
    ));
}

#[test]
fn test_find_closest_from_point() {
    let engine = paris_engine();
    let found = engine.find_closest_from_point(48.84, 2.367, 2).unwrap();
    let keys: Vec<&str> = found.iter().map(|(_, k)| k.as_str()).collect();
    assert_eq!(keys, vec!["ORY", "LBG"]);

    assert!(engine.find_closest_from_point(48.84, 2.367, 0).unwrap().is_empty());
    // Asking past the dataset returns everything, Nice included.
    let all = engine.find_closest_from_point(48.84, 2.367, 50).unwrap();
    assert_eq!(all.len(), 5);
    assert_eq!(all.last().unwrap().1.as_str(), "NCE");
}

#[test]
fn test_find_closest_from_key() {
    let engine = paris_engine();
    let found = engine.find_closest_from_key("CDG", 1, false).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].1.as_str(), "LBG");

    let with_self = engine.find_closest_from_key("CDG", 1, true).unwrap();
    assert_eq!(with_self[0].1.as_str(), "CDG");
    assert_eq!(with_self[0].0, 0.0);
}

#[test]
fn test_distance_orly_roissy() {
    let engine = paris_engine();
    let d = engine.distance("ORY", "CDG").unwrap();
    assert!((d - 34.87).abs() < 0.1, "ORY-CDG was {d} km");
    assert_eq!(engine.distance("CDG", "ORY").unwrap(), d);
    assert_eq!(engine.distance("ORY", "ORY").unwrap(), 0.0);
}

#[test]
fn test_distance_requires_points_on_both_sides() {
    let mut engine = paris_engine();
    engine.set("XDL", "name", Value::from("Lille (no coordinates)"));
    assert!(matches!(
        engine.distance("ORY", "XDL"),
        Err(GeodexError::MissingCoordinate { .. })
    ));
    assert!(matches!(
        engine.distance("XDL", "ORY"),
        Err(GeodexError::MissingCoordinate { .. })
    ));
}

#[test]
fn test_dataset_without_coordinates_stays_queryable() {
    let rows = vec![SourceRow::new(
        "FR",
        FieldMap::from_iter([("name".to_string(), Value::from("France"))]),
        1,
    )];
    let (engine, report) = Geodex::load(rows, LoadOptions::default());
    assert_eq!(report.records_without_point, 0);
    assert_eq!(engine.value("FR", "name").unwrap(), Value::from("France"));
    assert!(engine.find_near_point(48.84, 2.367, 100.0).unwrap().is_empty());
}
