//! The query facade.
//!
//! [`Geodex`] composes the record store, the spatial grid and the fuzzy
//! matcher into the one surface external callers consume. Reads take
//! `&self` and are safe to run concurrently; mutations take `&mut self`,
//! bump the store generation and swap in a freshly built grid snapshot,
//! so geo queries never observe a half-updated index.

use crate::condition::{CombineMode, Condition};
use geodex_core::ports::{LoadOptions, LoadReport, SourceRow};
use geodex_core::{FieldMap, GeoPoint, GeodexError, Key, Record, Result, Value};
use geodex_geo::cell::resolve_precision;
use geodex_geo::grid::rank_by_distance;
use geodex_geo::{haversine, GeoGrid};
use geodex_match::{FuzzyMatcher, PhoneticCode};
use geodex_store::{Keys, RecordStore};
use std::collections::BTreeSet;

/// An in-memory reference-data lookup engine over one loaded dataset.
pub struct Geodex {
    store: RecordStore,
    matcher: FuzzyMatcher,
    grid: GeoGrid,
    precision: u8,
}

impl Geodex {
    /// An empty engine; rows arrive later through [`add`](Self::add) or
    /// [`set`](Self::set).
    pub fn new(options: LoadOptions) -> Self {
        let precision = resolve_precision(&options.grid);
        Self {
            store: RecordStore::new(options.duplicate_policy, options.coordinates.clone()),
            matcher: FuzzyMatcher::new(options.matching),
            grid: GeoGrid::empty(precision, 0),
            precision,
        }
    }

    /// Build an engine from loader rows. Malformed rows never abort the
    /// load; they are tallied in the returned report.
    pub fn load(rows: impl IntoIterator<Item = SourceRow>, options: LoadOptions) -> (Self, LoadReport) {
        let precision = resolve_precision(&options.grid);
        let mut store = RecordStore::new(options.duplicate_policy, options.coordinates.clone());
        let mut report = LoadReport::default();

        for row in rows {
            let Some(key) = row.key else {
                report.rows_without_key += 1;
                continue;
            };
            let requested = key.clone();
            match store.add(key, row.fields, row.line_number) {
                None => report.duplicates_discarded += 1,
                Some(used) => {
                    if used != requested {
                        report.duplicates_renamed += 1;
                    }
                    report.records_loaded += 1;
                }
            }
        }

        // Without declared coordinate fields every record is point-free
        // and the count would only be noise.
        if options.coordinates.is_some() {
            report.records_without_point = store.records().filter(|r| r.point().is_none()).count();
        }

        let entries: Vec<(Key, GeoPoint)> = store.geo_entries().collect();
        let grid = GeoGrid::build(precision, store.generation(), entries);

        tracing::info!(
            records = report.records_loaded,
            renamed = report.duplicates_renamed,
            discarded = report.duplicates_discarded,
            skipped = report.rows_without_key,
            ungeocoded = report.records_without_point,
            precision,
            "dataset loaded"
        );

        let engine = Self { store, matcher: FuzzyMatcher::new(options.matching), grid, precision };
        (engine, report)
    }

    // --- exact lookups ---------------------------------------------------

    pub fn get(&self, key: &str) -> Result<&Record> {
        self.store.get(key)
    }

    /// A single field value of one record.
    pub fn value(&self, key: &str, field: &str) -> Result<Value> {
        self.store.value(key, field)
    }

    /// Like [`value`](Self::value), but an unknown key yields `default`.
    /// The default never rescues a field the record does not carry.
    pub fn get_or(&self, key: &str, field: &str, default: Value) -> Result<Value> {
        if !self.store.contains(key) {
            return Ok(default);
        }
        self.store.value(key, field)
    }

    // --- conditional queries ---------------------------------------------

    /// Records matching the field-equality `conditions` under `mode`,
    /// as `(position-in-store, key)` pairs in insertion order. An empty
    /// condition list matches everything.
    pub fn find_with(
        &self,
        conditions: &[Condition],
        mode: CombineMode,
    ) -> Result<Vec<(usize, Key)>> {
        for condition in conditions {
            if !self.store.knows_field(&condition.field) {
                return Err(GeodexError::InvalidField { field: condition.field.clone() });
            }
        }

        if conditions.is_empty() {
            return Ok(self.enumerate_all());
        }

        let sets: Vec<BTreeSet<Key>> = conditions
            .iter()
            .map(|condition| {
                let hits = self
                    .store
                    .find_exact(&condition.field, &condition.value)
                    .cloned()
                    .unwrap_or_default();
                if condition.negated {
                    self.store.key_set().difference(&hits).cloned().collect()
                } else {
                    hits
                }
            })
            .collect();

        let mut sets = sets.into_iter();
        let first = sets.next().unwrap_or_default();
        let combined = sets.fold(first, |acc, set| match mode {
            CombineMode::All => acc.intersection(&set).cloned().collect(),
            CombineMode::Any => acc.union(&set).cloned().collect(),
        });

        Ok(self
            .store
            .records()
            .enumerate()
            .filter(|(_, record)| combined.contains(record.key()))
            .map(|(position, record)| (position, record.key().clone()))
            .collect())
    }

    // --- proximity queries -----------------------------------------------

    /// Keys within `radius_km` of a point, sorted ascending by distance,
    /// ties broken by key.
    pub fn find_near_point(&self, lat: f64, lng: f64, radius_km: f64) -> Result<Vec<(f64, Key)>> {
        let origin = GeoPoint::new(lat, lng)?;
        let mut found = self.grid.radius_search(origin, radius_km);
        rank_by_distance(&mut found);
        Ok(found)
    }

    /// Keys within `radius_km` of another record's point.
    pub fn find_near_key(
        &self,
        key: &str,
        radius_km: f64,
        include_self: bool,
    ) -> Result<Vec<(f64, Key)>> {
        let origin = self.point_of(key)?;
        let mut found = self.grid.radius_search(origin, radius_km);
        if !include_self {
            found.retain(|(_, k)| k.as_str() != key);
        }
        rank_by_distance(&mut found);
        Ok(found)
    }

    /// The `n` keys closest to a point, sorted ascending by distance.
    pub fn find_closest_from_point(&self, lat: f64, lng: f64, n: usize) -> Result<Vec<(f64, Key)>> {
        let origin = GeoPoint::new(lat, lng)?;
        Ok(self.grid.k_nearest(origin, n))
    }

    /// The `n` keys closest to another record's point.
    pub fn find_closest_from_key(
        &self,
        key: &str,
        n: usize,
        include_self: bool,
    ) -> Result<Vec<(f64, Key)>> {
        let origin = self.point_of(key)?;
        if include_self {
            return Ok(self.grid.k_nearest(origin, n));
        }
        let mut found = self.grid.k_nearest(origin, n.saturating_add(1));
        found.retain(|(_, k)| k.as_str() != key);
        found.truncate(n);
        Ok(found)
    }

    /// Haversine distance in kilometers between two records' points.
    pub fn distance(&self, key_a: &str, key_b: &str) -> Result<f64> {
        Ok(haversine(self.point_of(key_a)?, self.point_of(key_b)?))
    }

    // --- approximate-name queries ----------------------------------------

    /// Rank records by similarity of their `field` to a free-text query,
    /// best first, ties broken by key. Records lacking the field are
    /// skipped; scores below the configured minimum are dropped.
    pub fn fuzzy_find(
        &self,
        query: &str,
        field: &str,
        top_n: Option<usize>,
    ) -> Result<Vec<(f64, Key)>> {
        let candidates = self.field_candidates(field)?;
        Ok(self.matcher.rank(query, candidates, top_n))
    }

    /// Same contract as [`fuzzy_find`](Self::fuzzy_find), memoized per
    /// `(cleaned query, field)` until [`clear_fuzzy_cache`](Self::clear_fuzzy_cache).
    pub fn fuzzy_find_cached(
        &self,
        query: &str,
        field: &str,
        top_n: Option<usize>,
    ) -> Result<Vec<(f64, Key)>> {
        let candidates = self.field_candidates(field)?;
        Ok(self.matcher.rank_cached(field, query, candidates, top_n))
    }

    /// Fuzzy search restricted to the given keys. Bypasses the cache: a
    /// restricted ranking under the same query would poison it.
    pub fn fuzzy_find_from_keys(
        &self,
        query: &str,
        field: &str,
        keys: &[Key],
        top_n: Option<usize>,
    ) -> Result<Vec<(f64, Key)>> {
        if !self.store.knows_field(field) {
            return Err(GeodexError::InvalidField { field: field.to_string() });
        }
        let allowed: BTreeSet<&Key> = keys.iter().collect();
        let candidates: Vec<(Key, String)> = self
            .store
            .records()
            .filter(|record| allowed.contains(record.key()))
            .filter_map(|record| {
                record.field(field).map(|v| (record.key().clone(), v.display_text()))
            })
            .collect();
        Ok(self.matcher.rank(query, candidates, top_n))
    }

    /// Restrict candidates to a radius around a point, then rank by
    /// similarity. Uncached.
    pub fn fuzzy_find_near_point(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
        query: &str,
        field: &str,
        top_n: Option<usize>,
    ) -> Result<Vec<(f64, Key)>> {
        let origin = GeoPoint::new(lat, lng)?;
        if !self.store.knows_field(field) {
            return Err(GeodexError::InvalidField { field: field.to_string() });
        }
        let nearby: BTreeSet<Key> =
            self.grid.radius_search(origin, radius_km).into_iter().map(|(_, k)| k).collect();
        let candidates: Vec<(Key, String)> = self
            .store
            .records()
            .filter(|record| nearby.contains(record.key()))
            .filter_map(|record| {
                record.field(field).map(|v| (record.key().clone(), v.display_text()))
            })
            .collect();
        Ok(self.matcher.rank(query, candidates, top_n))
    }

    /// Records whose `field` sounds like the query, in insertion order,
    /// with the phonetic code each one matched on.
    pub fn phonetic_find(&self, query: &str, field: &str) -> Result<Vec<(PhoneticCode, Key)>> {
        let candidates = self.field_candidates(field)?;
        Ok(self.matcher.phonetic_filter(query, candidates))
    }

    pub fn clear_fuzzy_cache(&self) {
        self.matcher.clear_cache();
    }

    /// Pin the fuzzy answer for one query/field pair; consulted before
    /// the regular cache.
    pub fn bias_fuzzy_cache(&self, field: &str, query: &str, results: Vec<(f64, Key)>) {
        self.matcher.set_bias(field, query, results);
    }

    pub fn clear_fuzzy_bias_cache(&self) {
        self.matcher.clear_bias_cache();
    }

    // --- introspection ----------------------------------------------------

    /// Known field names, in first-seen order.
    pub fn fields(&self) -> &[String] {
        self.store.fields()
    }

    /// Keys in insertion order; fails fast if the store mutates during
    /// iteration.
    pub fn keys(&self) -> Keys {
        self.store.keys()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.contains(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    // --- mutation ----------------------------------------------------------

    /// Insert a record, applying the duplicate policy on collision.
    /// Returns the key actually used, `None` when the row was discarded.
    pub fn add(&mut self, key: impl Into<Key>, fields: FieldMap, line_number: u64) -> Option<Key> {
        let used = self.store.add(key.into(), fields, line_number);
        self.refresh_grid();
        used
    }

    /// Upsert one field, creating the record if absent.
    pub fn set(&mut self, key: impl Into<Key>, field: impl Into<String>, value: Value) {
        self.store.set(key.into(), field, value);
        self.refresh_grid();
    }

    /// Delete a record and evict it from every derived index.
    pub fn remove(&mut self, key: &str) -> Result<Record> {
        let removed = self.store.remove(key)?;
        self.refresh_grid();
        Ok(removed)
    }

    pub fn remove_field(&mut self, key: &str, field: &str) -> Result<Value> {
        let removed = self.store.remove_field(key, field)?;
        self.refresh_grid();
        Ok(removed)
    }

    // --- internals ---------------------------------------------------------

    fn point_of(&self, key: &str) -> Result<GeoPoint> {
        self.store
            .get(key)?
            .point()
            .ok_or_else(|| GeodexError::MissingCoordinate { key: key.to_string() })
    }

    fn field_candidates(&self, field: &str) -> Result<Vec<(Key, String)>> {
        if !self.store.knows_field(field) {
            return Err(GeodexError::InvalidField { field: field.to_string() });
        }
        Ok(self
            .store
            .records()
            .filter_map(|record| {
                record.field(field).map(|v| (record.key().clone(), v.display_text()))
            })
            .collect())
    }

    fn enumerate_all(&self) -> Vec<(usize, Key)> {
        self.store
            .records()
            .enumerate()
            .map(|(position, record)| (position, record.key().clone()))
            .collect()
    }

    fn refresh_grid(&mut self) {
        let entries: Vec<(Key, GeoPoint)> = self.store.geo_entries().collect();
        self.grid = GeoGrid::build(self.precision, self.store.generation(), entries);
    }
}
