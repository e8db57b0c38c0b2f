//! Conditions for exact-match queries.

use geodex_core::Value;

/// One field-equality test, optionally negated.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub value: Value,
    pub negated: bool,
}

impl Condition {
    /// Match records whose `field` equals `value`.
    pub fn is(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { field: field.into(), value: value.into(), negated: false }
    }

    /// Match records whose `field` differs from `value` (including
    /// records that lack the field entirely).
    pub fn is_not(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { field: field.into(), value: value.into(), negated: true }
    }
}

/// How several conditions combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CombineMode {
    /// Every condition must hold (boolean AND).
    #[default]
    All,
    /// At least one condition must hold (boolean OR).
    Any,
}
