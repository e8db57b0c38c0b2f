//! Cleaning of names before comparison.
//!
//! Comparisons should not count the words every station name carries:
//! "Aix-Les Bains" and "Aix" are the same place, "St-Etienne" and
//! "Saint Etienne" the same spelling. Cleaning lowercases, folds
//! accents, splits on punctuation, expands the common abbreviations and
//! drops words transparent to identity.

/// Words removed before comparison (articles and filler found in French
/// and English station names).
const TRANSPARENT_WORDS: &[&str] = &[
    // French
    "le", "la", "les", "ville", "sncf", "hbf", "bains", "eaux", "rive", "droite", "gauche",
    // English
    "a", "an", "the", "and", "or",
];

/// Abbreviations expanded to their full spelling.
const ALIASES: &[(&str, &str)] = &[("st", "saint"), ("hb", "hbf")];

pub(crate) fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'â' | 'ä' | 'á' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'î' | 'ï' | 'í' | 'ì' => 'i',
        'ô' | 'ö' | 'ó' | 'ò' | 'õ' => 'o',
        'ù' | 'û' | 'ü' | 'ú' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        _ => c,
    }
}

fn is_separator(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '+' | '-' | ':' | ',' | ';' | '.' | '\'' | '"' | '?' | '!' | '#' | '@' | '|' | '(' | ')' | '/'
        )
}

/// Lowercase, fold diacritics, collapse separators and whitespace runs to
/// single spaces. Deterministic and pure.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars().flat_map(char::to_lowercase).map(fold_diacritic) {
        if is_separator(c) {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    out
}

/// Normalized word list with aliases expanded and noise dropped:
/// transparent words and bare numbers do not survive.
pub fn tokens(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|word| !word.is_empty())
        .map(|word| {
            ALIASES
                .iter()
                .find(|(short, _)| *short == word)
                .map(|(_, full)| full.to_string())
                .unwrap_or_else(|| word.to_string())
        })
        .filter(|word| !TRANSPARENT_WORDS.contains(&word.as_str()))
        .filter(|word| !word.chars().all(|c| c.is_ascii_digit()))
        .collect()
}

/// The canonical comparison form: cleaned tokens joined by single spaces.
pub fn clean(text: &str) -> String {
    tokens(text).join(" ")
}
