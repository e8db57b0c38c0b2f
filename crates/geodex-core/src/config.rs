//! Configuration for the store, the spatial grid, and the fuzzy matcher.
//!
//! Plain serde-derived structs with documented defaults. geodex owns no
//! configuration file; external callers build these values however they
//! load their own settings.

use serde::{Deserialize, Serialize};

/// What to do when a loaded row collides with an existing key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Keep the row under a derived key (`"NCE@1"`), linked to the
    /// original through the reserved duplicate/parent data.
    #[default]
    Rename,
    /// Drop the colliding row.
    Discard,
}

/// Spatial grid sizing.
///
/// `precision` is the geohash length of one cell. When `radius_km` is set
/// instead, the precision is picked so one cell spans roughly that radius.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub precision: Option<u8>,
    pub radius_km: Option<f64>,
}

impl GridConfig {
    pub fn with_precision(precision: u8) -> Self {
        Self { precision: Some(precision), radius_km: None }
    }

    pub fn with_radius_km(radius_km: f64) -> Self {
        Self { precision: None, radius_km: Some(radius_km) }
    }
}

/// Fuzzy matching thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Matches scoring below this are dropped from fuzzy results.
    pub min_match: f64,
    /// Lift the score of token-inclusion matches (one cleaned token
    /// sequence contained in the other) to `inclusion_score`.
    pub inclusion_heuristic: bool,
    pub inclusion_score: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self { min_match: 0.75, inclusion_heuristic: true, inclusion_score: 0.90 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(DuplicatePolicy::default(), DuplicatePolicy::Rename);
        assert_eq!(GridConfig::default(), GridConfig { precision: None, radius_km: None });
        let matching = MatchConfig::default();
        assert_eq!(matching.min_match, 0.75);
        assert!(matching.inclusion_heuristic);
        assert_eq!(matching.inclusion_score, 0.90);
    }
}
