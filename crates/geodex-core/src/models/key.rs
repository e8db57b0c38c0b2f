use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique string identifier of a record, e.g. an airport IATA code.
///
/// Keys are unique within a store. When a duplicate row is kept rather than
/// discarded, a derived key is minted with a numeric suffix (`"NCE@1"`).
/// `Ord` is derived so ties in distance or score rankings break
/// deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Mint the n-th derived key for a duplicated base key.
    pub fn derived(&self, n: usize) -> Key {
        Key(format!("{}@{}", self.0, n))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key(s)
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
