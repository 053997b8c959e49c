//! Row selection criteria for read operations.

use serde::{Deserialize, Serialize};

/// One endpoint of a row range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeBound {
    /// No bound on this side.
    Unbounded,
    /// The bound key is included in the range.
    Inclusive(String),
    /// The bound key is excluded from the range.
    Exclusive(String),
}

/// A contiguous range of row keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    /// Lower endpoint.
    pub start: RangeBound,
    /// Upper endpoint.
    pub end: RangeBound,
}

impl RowRange {
    /// A range with explicit endpoints.
    pub fn new(start: RangeBound, end: RangeBound) -> Self {
        Self { start, end }
    }

    /// The range `[start, end)`.
    pub fn right_open(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: RangeBound::Inclusive(start.into()),
            end: RangeBound::Exclusive(end.into()),
        }
    }

    /// The range `[start, +inf)`.
    pub fn starting_at(start: impl Into<String>) -> Self {
        Self {
            start: RangeBound::Inclusive(start.into()),
            end: RangeBound::Unbounded,
        }
    }

    /// Whether every key in the range is `<= key`.
    fn ends_at_or_before(&self, key: &str) -> bool {
        match &self.end {
            RangeBound::Unbounded => false,
            RangeBound::Inclusive(e) => e.as_str() <= key,
            RangeBound::Exclusive(e) => e.as_str() <= key,
        }
    }

    /// Whether the range admits keys `<= key`.
    fn starts_at_or_before(&self, key: &str) -> bool {
        match &self.start {
            RangeBound::Unbounded => true,
            RangeBound::Inclusive(s) => s.as_str() <= key,
            RangeBound::Exclusive(s) => s.as_str() < key,
        }
    }
}

/// The set of rows a read operation targets: explicit keys plus ranges.
///
/// An empty `RowSet` selects *all* rows. The client core passes row sets
/// through to the wire unchanged, except for [`RowSet::advance_past`], which
/// implements resume-after-stream-break semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSet {
    row_keys: Vec<String>,
    row_ranges: Vec<RowRange>,
}

impl RowSet {
    /// The set selecting all rows.
    pub fn all() -> Self {
        Self::default()
    }

    /// A set selecting exactly one key.
    pub fn from_key(key: impl Into<String>) -> Self {
        Self {
            row_keys: vec![key.into()],
            row_ranges: Vec::new(),
        }
    }

    /// Add one explicit key.
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.row_keys.push(key.into());
    }

    /// Add one range.
    pub fn push_range(&mut self, range: RowRange) {
        self.row_ranges.push(range);
    }

    /// Add one explicit key, builder style.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.row_keys.push(key.into());
        self
    }

    /// Add one range, builder style.
    pub fn with_range(mut self, range: RowRange) -> Self {
        self.row_ranges.push(range);
        self
    }

    /// The explicit keys in the set.
    pub fn row_keys(&self) -> &[String] {
        &self.row_keys
    }

    /// The ranges in the set.
    pub fn row_ranges(&self) -> &[RowRange] {
        &self.row_ranges
    }

    /// Whether the set selects all rows (no keys and no ranges).
    pub fn is_all(&self) -> bool {
        self.row_keys.is_empty() && self.row_ranges.is_empty()
    }

    /// Whether the set selects nothing after advancement.
    ///
    /// Note that a freshly constructed empty set means "all rows"; only a
    /// set that became empty through [`RowSet::advance_past`] selects
    /// nothing. Callers must track which case applies.
    pub fn is_empty(&self) -> bool {
        self.row_keys.is_empty() && self.row_ranges.is_empty()
    }

    /// Restrict the set to keys strictly greater than `last_key`.
    ///
    /// This is the resume operation after a broken read stream: the reader
    /// has confirmed every row up to and including `last_key`, so the
    /// reopened stream must start immediately after it. A set that selects
    /// all rows becomes the open range `(last_key, +inf)`.
    pub fn advance_past(self, last_key: &str) -> Self {
        if self.is_all() {
            return Self {
                row_keys: Vec::new(),
                row_ranges: vec![RowRange::new(
                    RangeBound::Exclusive(last_key.to_owned()),
                    RangeBound::Unbounded,
                )],
            };
        }

        let row_keys = self
            .row_keys
            .into_iter()
            .filter(|k| k.as_str() > last_key)
            .collect();
        let row_ranges = self
            .row_ranges
            .into_iter()
            .filter(|r| !r.ends_at_or_before(last_key))
            .map(|mut r| {
                if r.starts_at_or_before(last_key) {
                    r.start = RangeBound::Exclusive(last_key.to_owned());
                }
                r
            })
            .collect();
        Self {
            row_keys,
            row_ranges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_rows_advances_to_open_range() {
        let advanced = RowSet::all().advance_past("r2");
        assert!(!advanced.is_empty());
        assert_eq!(advanced.row_ranges().len(), 1);
        assert_eq!(
            advanced.row_ranges()[0].start,
            RangeBound::Exclusive("r2".into())
        );
    }

    #[test]
    fn keys_at_or_before_resume_point_are_dropped() {
        let advanced = RowSet::all()
            .with_key("r1")
            .with_key("r2")
            .with_key("r3")
            .advance_past("r2");
        assert_eq!(advanced.row_keys(), ["r3".to_string()]);
    }

    #[test]
    fn ranges_are_clipped_or_dropped() {
        let advanced = RowSet::all()
            .with_range(RowRange::right_open("a", "b"))
            .with_range(RowRange::right_open("a", "z"))
            .advance_past("c");

        // [a, b) lies entirely before the resume point; [a, z) is clipped.
        assert_eq!(advanced.row_ranges().len(), 1);
        assert_eq!(
            advanced.row_ranges()[0].start,
            RangeBound::Exclusive("c".into())
        );
        assert_eq!(
            advanced.row_ranges()[0].end,
            RangeBound::Exclusive("z".into())
        );
    }

    #[test]
    fn explicit_set_can_become_empty() {
        let advanced = RowSet::from_key("r1").advance_past("r1");
        assert!(advanced.is_empty());
    }

    #[test]
    fn range_starting_after_resume_point_is_untouched() {
        let advanced = RowSet::all()
            .with_range(RowRange::right_open("m", "z"))
            .advance_past("c");
        assert_eq!(
            advanced.row_ranges()[0].start,
            RangeBound::Inclusive("m".into())
        );
    }
}
