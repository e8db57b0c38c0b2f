use serde::{Deserialize, Serialize};
use std::fmt;

/// A field value: free text, a number, or a list resolved from a
/// sub-delimited cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Numeric reading of the value. Text values are parsed leniently so
    /// coordinates loaded from text columns resolve without a schema.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            Value::List(_) => None,
        }
    }

    /// Flat text rendering used for fuzzy and phonetic matching.
    pub fn display_text(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::List(items) => items.join(" "),
        }
    }

    /// Canonical key used by the field index. Tagged per variant so a text
    /// cell can never collide with a list rendering of the same characters.
    pub fn index_key(&self) -> String {
        match self {
            Value::Text(s) => format!("t:{s}"),
            Value::Number(n) => format!("n:{n}"),
            Value::List(items) => format!("l:{}", items.join("\u{1f}")),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}
