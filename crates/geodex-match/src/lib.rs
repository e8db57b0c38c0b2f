//! Geodex Match - Approximate and phonetic name matching
//!
//! Resolves free-text names ("paris de gaulle", "sheekago") to record
//! keys. Station and airport names are messy: accents, articles, railway
//! operator suffixes, house numbers. Normalization strips that noise, a
//! Levenshtein ratio scores what remains, and a double-metaphone layer
//! matches names by sound when spelling has drifted too far.

pub mod levenshtein;
pub mod matcher;
pub mod metaphone;
pub mod normalize;

pub use matcher::FuzzyMatcher;
pub use metaphone::{double_metaphone, PhoneticCode};
