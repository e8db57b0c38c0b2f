//! The fuzzy matcher: similarity scoring, ranking, and caches.
//!
//! Caches are owned by the matcher instance, never process-wide, so two
//! engines over different datasets cannot cross-contaminate results.
//! Lock poisoning propagates the panic that caused it.

use crate::levenshtein::ratio;
use crate::metaphone::{double_metaphone, PhoneticCode};
use crate::normalize::{clean, normalize, tokens};
use geodex_core::config::MatchConfig;
use geodex_core::Key;
use std::collections::HashMap;
use std::sync::RwLock;

/// `(cleaned query, field)` — what a memoized ranking is keyed by.
type CacheEntry = (String, String);

/// Ranks candidate field values by similarity to a free-text query.
#[derive(Debug, Default)]
pub struct FuzzyMatcher {
    config: MatchConfig,
    cache: RwLock<HashMap<CacheEntry, Vec<(f64, Key)>>>,
    bias: RwLock<HashMap<CacheEntry, Vec<(f64, Key)>>>,
}

impl FuzzyMatcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config, cache: RwLock::default(), bias: RwLock::default() }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Similarity score in [0, 1] between two strings, after cleaning.
    ///
    /// Symmetric. Identical inputs score 1.0; two empty strings are a
    /// perfect match; an empty string against a non-empty one scores 0.
    /// When one cleaned token sequence is contained in the other
    /// (order-preserving), the score is lifted to the configured
    /// inclusion score: "Aéroport CDG 2 TGV" should not be penalized for
    /// the words "aeroport-cdg" lacks.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        let tokens_a = tokens(a);
        let tokens_b = tokens(b);

        // Cleaning can empty a string entirely ("the 2"); fall back to
        // the raw normalized forms so identity still scores 1.0.
        let (join_a, join_b) = if tokens_a.is_empty() && tokens_b.is_empty() {
            (normalize(a), normalize(b))
        } else {
            (tokens_a.join(" "), tokens_b.join(" "))
        };

        if join_a.is_empty() != join_b.is_empty() {
            return 0.0;
        }

        let score = ratio(&join_a, &join_b);
        if score == 1.0 {
            return score;
        }

        if self.config.inclusion_heuristic
            && !tokens_a.is_empty()
            && !tokens_b.is_empty()
            && (is_subsequence(&tokens_a, &tokens_b) || is_subsequence(&tokens_b, &tokens_a))
        {
            return score.max(self.config.inclusion_score);
        }

        score
    }

    /// Score every `(key, value)` candidate against `query`, drop scores
    /// below the configured minimum, and return the best `top_n` matches
    /// descending by score, ties broken by key ordering.
    pub fn rank(
        &self,
        query: &str,
        candidates: impl IntoIterator<Item = (Key, String)>,
        top_n: Option<usize>,
    ) -> Vec<(f64, Key)> {
        let mut results: Vec<(f64, Key)> = candidates
            .into_iter()
            .map(|(key, value)| (self.similarity(query, &value), key))
            .filter(|(score, _)| *score >= self.config.min_match)
            .collect();

        results.sort_by(|a, b| {
            b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.1.cmp(&b.1))
        });
        if let Some(n) = top_n {
            results.truncate(n);
        }
        results
    }

    /// Same contract as [`rank`](Self::rank), memoizing the full ranking
    /// under `(cleaned query, field)`. The bias cache is consulted first
    /// and short-circuits the search entirely. Entries never expire;
    /// clearing is explicit.
    pub fn rank_cached(
        &self,
        field: &str,
        query: &str,
        candidates: impl IntoIterator<Item = (Key, String)>,
        top_n: Option<usize>,
    ) -> Vec<(f64, Key)> {
        let entry: CacheEntry = (clean(query), field.to_string());

        if let Some(forced) = self.bias.read().unwrap().get(&entry) {
            tracing::debug!(query, field, "fuzzy search answered from bias cache");
            return truncated(forced.clone(), top_n);
        }

        if let Some(cached) = self.cache.read().unwrap().get(&entry) {
            return truncated(cached.clone(), top_n);
        }

        let ranked = self.rank(query, candidates, None);
        self.cache.write().unwrap().insert(entry, ranked.clone());
        truncated(ranked, top_n)
    }

    /// Pin the answer for one query/field pair. Useful when the ranking
    /// misbehaves on a known input and the caller wants to force the
    /// expected result without retuning thresholds.
    pub fn set_bias(&self, field: &str, query: &str, results: Vec<(f64, Key)>) {
        let entry: CacheEntry = (clean(query), field.to_string());
        self.bias.write().unwrap().insert(entry, results);
    }

    pub fn clear_cache(&self) {
        self.cache.write().unwrap().clear();
    }

    pub fn clear_bias_cache(&self) {
        self.bias.write().unwrap().clear();
    }

    /// Keep only candidates phonetically equal to `query`, in input
    /// order, with the code each one matched on.
    pub fn phonetic_filter(
        &self,
        query: &str,
        candidates: impl IntoIterator<Item = (Key, String)>,
    ) -> Vec<(PhoneticCode, Key)> {
        let wanted = double_metaphone(query);
        candidates
            .into_iter()
            .filter_map(|(key, value)| {
                let code = double_metaphone(&value);
                code.matches(&wanted).then_some((code, key))
            })
            .collect()
    }
}

fn truncated(mut results: Vec<(f64, Key)>, top_n: Option<usize>) -> Vec<(f64, Key)> {
    if let Some(n) = top_n {
        results.truncate(n);
    }
    results
}

/// Order-preserving containment of one token sequence in another.
fn is_subsequence(needle: &[String], hay: &[String]) -> bool {
    let mut hay = hay.iter();
    needle.iter().all(|wanted| hay.any(|word| word == wanted))
}
