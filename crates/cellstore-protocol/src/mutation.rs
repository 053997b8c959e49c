//! Cell-level mutations and the batches they are submitted in.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::status::Status;

/// A half-open timestamp range, in microseconds since the epoch.
///
/// `None` bounds are unbounded on that side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampRange {
    /// Inclusive lower bound.
    pub start_micros: Option<i64>,
    /// Exclusive upper bound.
    pub end_micros: Option<i64>,
}

/// An atomic change to a single row.
///
/// Mutations are immutable once constructed and are *moved* into wire
/// requests when encoded; after encoding they cannot be reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    /// Set the value of one cell.
    ///
    /// `timestamp_micros` of `None` asks the server to assign the current
    /// time, which makes the mutation non-idempotent: replaying it produces
    /// a different cell.
    SetCell {
        /// Column family name.
        family_name: String,
        /// Column qualifier within the family.
        column_qualifier: Bytes,
        /// Cell timestamp; `None` means server-assigned.
        timestamp_micros: Option<i64>,
        /// Cell value.
        value: Bytes,
    },
    /// Delete cells from one column, optionally restricted to a time range.
    DeleteFromColumn {
        /// Column family name.
        family_name: String,
        /// Column qualifier within the family.
        column_qualifier: Bytes,
        /// Restrict the deletion to cells in this range, if set.
        time_range: Option<TimestampRange>,
    },
    /// Delete all cells from one column family.
    DeleteFromFamily {
        /// Column family name.
        family_name: String,
    },
    /// Delete the entire row.
    DeleteFromRow,
}

impl Mutation {
    /// Set a cell to `value` at an explicit timestamp.
    pub fn set_cell(
        family_name: impl Into<String>,
        column_qualifier: impl Into<Bytes>,
        timestamp_micros: i64,
        value: impl Into<Bytes>,
    ) -> Self {
        Mutation::SetCell {
            family_name: family_name.into(),
            column_qualifier: column_qualifier.into(),
            timestamp_micros: Some(timestamp_micros),
            value: value.into(),
        }
    }

    /// Set a cell to `value` with a server-assigned timestamp.
    ///
    /// Note that this variant is not idempotent under the default
    /// idempotency policy.
    pub fn set_cell_server_time(
        family_name: impl Into<String>,
        column_qualifier: impl Into<Bytes>,
        value: impl Into<Bytes>,
    ) -> Self {
        Mutation::SetCell {
            family_name: family_name.into(),
            column_qualifier: column_qualifier.into(),
            timestamp_micros: None,
            value: value.into(),
        }
    }

    /// Delete all cells in one column.
    pub fn delete_from_column(
        family_name: impl Into<String>,
        column_qualifier: impl Into<Bytes>,
    ) -> Self {
        Mutation::DeleteFromColumn {
            family_name: family_name.into(),
            column_qualifier: column_qualifier.into(),
            time_range: None,
        }
    }

    /// Delete all cells in one column family.
    pub fn delete_from_family(family_name: impl Into<String>) -> Self {
        Mutation::DeleteFromFamily {
            family_name: family_name.into(),
        }
    }

    /// Delete the entire row.
    pub fn delete_from_row() -> Self {
        Mutation::DeleteFromRow
    }
}

/// An ordered set of mutations applied atomically to a single row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMutation {
    row_key: String,
    mutations: Vec<Mutation>,
}

impl RowMutation {
    /// Create an empty mutation for `row_key`.
    pub fn new(row_key: impl Into<String>) -> Self {
        Self {
            row_key: row_key.into(),
            mutations: Vec::new(),
        }
    }

    /// The key of the row this mutation targets.
    pub fn row_key(&self) -> &str {
        &self.row_key
    }

    /// The mutations applied to the row, in order.
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Append one mutation.
    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    /// Append one mutation, builder style.
    pub fn with(mut self, mutation: Mutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    /// Whether the mutation carries no operations.
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Decompose into row key and mutation list, consuming `self`.
    pub fn into_parts(self) -> (String, Vec<Mutation>) {
        (self.row_key, self.mutations)
    }
}

impl<M> Extend<M> for RowMutation
where
    M: Into<Mutation>,
{
    fn extend<T: IntoIterator<Item = M>>(&mut self, iter: T) {
        self.mutations.extend(iter.into_iter().map(Into::into));
    }
}

/// An ordered batch of independent row mutations.
///
/// Order matters only for aligning the final per-mutation outcome list to
/// submission order; the mutations themselves are independent and may be
/// resolved by the service in any order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkMutation {
    mutations: Vec<RowMutation>,
}

impl BulkMutation {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row mutation; its original index is its position.
    pub fn push(&mut self, mutation: RowMutation) {
        self.mutations.push(mutation);
    }

    /// Append one row mutation, builder style.
    pub fn with(mut self, mutation: RowMutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    /// Number of row mutations in the batch.
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Consume the batch, yielding the row mutations in submission order.
    pub fn into_mutations(self) -> Vec<RowMutation> {
        self.mutations
    }
}

impl FromIterator<RowMutation> for BulkMutation {
    fn from_iter<T: IntoIterator<Item = RowMutation>>(iter: T) -> Self {
        Self {
            mutations: iter.into_iter().collect(),
        }
    }
}

/// Records that the row mutation at `index` in the submitted batch did not
/// succeed, with its terminal status.
///
/// The absence of an index from a failure list means that mutation
/// succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedMutation {
    /// Position of the failed mutation in the originally submitted batch.
    pub index: usize,
    /// Terminal status for that mutation.
    pub status: Status,
}

impl FailedMutation {
    /// Create a failure record.
    pub fn new(index: usize, status: Status) -> Self {
        Self { index, status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_mutation_preserves_order() {
        let m = RowMutation::new("r1")
            .with(Mutation::set_cell("fam", "col", 1000, "v1"))
            .with(Mutation::delete_from_column("fam", "old"))
            .with(Mutation::delete_from_row());

        assert_eq!(m.row_key(), "r1");
        assert_eq!(m.mutations().len(), 3);
        assert!(matches!(m.mutations()[0], Mutation::SetCell { .. }));
        assert!(matches!(m.mutations()[2], Mutation::DeleteFromRow));
    }

    #[test]
    fn into_parts_consumes() {
        let m = RowMutation::new("r1").with(Mutation::delete_from_family("fam"));
        let (key, muts) = m.into_parts();
        assert_eq!(key, "r1");
        assert_eq!(muts.len(), 1);
    }

    #[test]
    fn bulk_mutation_indexing_follows_submission_order() {
        let bulk: BulkMutation = ["a", "b", "c"]
            .into_iter()
            .map(|k| RowMutation::new(k).with(Mutation::delete_from_row()))
            .collect();
        assert_eq!(bulk.len(), 3);
        let muts = bulk.into_mutations();
        assert_eq!(muts[1].row_key(), "b");
    }

    #[test]
    fn server_time_set_cell_has_no_timestamp() {
        let m = Mutation::set_cell_server_time("fam", "col", "v");
        match m {
            Mutation::SetCell {
                timestamp_micros, ..
            } => assert!(timestamp_micros.is_none()),
            other => panic!("unexpected mutation: {other:?}"),
        }
    }
}
