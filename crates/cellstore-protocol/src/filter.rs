//! Cell filters for read operations.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A cell-level filter applied server-side to a read.
///
/// The client core treats filters as opaque: they are built here, carried in
/// the request, and passed through to the wire untouched. The constructors
/// cover the common cases; [`Filter::raw`] accepts any filter expression the
/// service understands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(Value);

impl Filter {
    /// Pass all cells through unchanged.
    pub fn pass_all() -> Self {
        Self(json!({ "pass_all": true }))
    }

    /// Keep only the most recent `n` versions of each cell.
    pub fn latest(n: u32) -> Self {
        Self(json!({ "cells_per_column": n }))
    }

    /// Keep only cells from families matching `pattern`.
    pub fn family_regex(pattern: impl Into<String>) -> Self {
        Self(json!({ "family_regex": pattern.into() }))
    }

    /// Keep only cells whose value equals `value`.
    pub fn value_equals(value: impl Into<String>) -> Self {
        Self(json!({ "value_equals": value.into() }))
    }

    /// An arbitrary filter expression, passed through verbatim.
    pub fn raw(expression: Value) -> Self {
        Self(expression)
    }

    /// The underlying filter expression.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}
