//! Wire request and response messages for each remote operation.
//!
//! Logical mutations are *moved* into requests: the encoding constructors
//! consume their [`RowMutation`] arguments, so a mutation cannot end up in
//! two requests. The bulk path builds a fresh request for every round
//! instead of sharing structures across rounds.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::filter::Filter;
use crate::mutation::{Mutation, RowMutation};
use crate::rowset::RowSet;
use crate::status::Status;

/// Request for the unary `MutateRow` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutateRowRequest {
    /// Fully qualified table name.
    pub table_name: String,
    /// Application profile to account the call against.
    pub app_profile_id: String,
    /// Key of the row to mutate.
    pub row_key: String,
    /// Mutations to apply atomically, in order.
    pub mutations: Vec<Mutation>,
}

impl MutateRowRequest {
    /// Encode a row mutation into a request, consuming it.
    pub fn encode(
        table_name: impl Into<String>,
        app_profile_id: impl Into<String>,
        mutation: RowMutation,
    ) -> Self {
        let (row_key, mutations) = mutation.into_parts();
        Self {
            table_name: table_name.into(),
            app_profile_id: app_profile_id.into(),
            row_key,
            mutations,
        }
    }
}

/// Response for `MutateRow`. Currently carries no payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutateRowResponse {}

/// One entry of a bulk mutation request: a complete row mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutateRowsEntry {
    /// Key of the row to mutate.
    pub row_key: String,
    /// Mutations to apply atomically to that row.
    pub mutations: Vec<Mutation>,
}

impl MutateRowsEntry {
    /// Encode a row mutation into a bulk entry, consuming it.
    pub fn encode(mutation: RowMutation) -> Self {
        let (row_key, mutations) = mutation.into_parts();
        Self { row_key, mutations }
    }
}

/// Request for the `MutateRows` bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutateRowsRequest {
    /// Fully qualified table name.
    pub table_name: String,
    /// Application profile to account the call against.
    pub app_profile_id: String,
    /// Independent per-row entries; the response reports one status per
    /// entry, indexed by position in this vector.
    pub entries: Vec<MutateRowsEntry>,
}

/// Per-entry outcome within a bulk response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutateRowsResult {
    /// Index into the request's `entries` vector.
    pub index: usize,
    /// Outcome for that entry.
    pub status: Status,
}

/// Response for `MutateRows`: one status per reported entry.
///
/// This is not an all-or-nothing RPC; entries succeed and fail
/// independently, and the server may omit entries it never processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutateRowsResponse {
    /// Outcomes for the entries the server processed.
    pub entries: Vec<MutateRowsResult>,
}

/// Request for the server-streaming `ReadRows` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadRowsRequest {
    /// Fully qualified table name.
    pub table_name: String,
    /// Application profile to account the call against.
    pub app_profile_id: String,
    /// Which rows to read; empty means all.
    pub rows: RowSet,
    /// Server-side cell filter.
    pub filter: Filter,
    /// Maximum number of rows to return; `None` means unbounded.
    pub rows_limit: Option<u64>,
}

/// End-of-row marker carried by a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    /// The current row is complete; all its cells have been delivered.
    CommitRow,
    /// Discard all data received for the current row and expect it to be
    /// re-sent from the beginning.
    ResetRow,
}

/// A fragment of row data within a read stream.
///
/// A single row's data may span many chunks, and one response may carry
/// chunks for several rows. Fields left `None` carry over from the previous
/// chunk of the same row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellChunk {
    /// Row key; `None` continues the row of the previous chunk.
    pub row_key: Option<String>,
    /// Column family; `None` continues the previous chunk's family.
    pub family_name: Option<String>,
    /// Column qualifier; `None` continues the previous chunk's qualifier.
    pub column_qualifier: Option<Bytes>,
    /// Cell timestamp in microseconds; meaningful on the first fragment of
    /// a cell.
    pub timestamp_micros: i64,
    /// Cell value, possibly one fragment of a larger value.
    pub value: Bytes,
    /// True when this chunk's value is an incomplete fragment and more
    /// fragments of the same cell follow.
    pub value_continues: bool,
    /// End-of-row marker, if any.
    pub row_status: Option<RowStatus>,
}

/// One message of the `ReadRows` response stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadRowsResponse {
    /// Row data fragments, in order.
    pub chunks: Vec<CellChunk>,
    /// The greatest row key the server has scanned so far, even if that row
    /// produced no chunks (for example because the filter removed it). Lets
    /// a resuming client skip rows it will never receive.
    pub last_scanned_row_key: Option<String>,
}

/// Request for the conditional `CheckAndMutateRow` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckAndMutateRowRequest {
    /// Fully qualified table name.
    pub table_name: String,
    /// Application profile to account the call against.
    pub app_profile_id: String,
    /// Key of the row to check and mutate.
    pub row_key: String,
    /// Predicate applied to the row's cells.
    pub predicate_filter: Filter,
    /// Mutations applied when the predicate matches at least one cell.
    pub true_mutations: Vec<Mutation>,
    /// Mutations applied when the predicate matches nothing.
    pub false_mutations: Vec<Mutation>,
}

/// Response for `CheckAndMutateRow`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckAndMutateRowResponse {
    /// Whether the predicate filter matched any cells in the row.
    pub predicate_matched: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_moves_mutation_into_request() {
        let m = RowMutation::new("r1").with(Mutation::set_cell("fam", "col", 42, "v"));
        let request = MutateRowRequest::encode("projects/p/tables/t", "profile", m);
        assert_eq!(request.row_key, "r1");
        assert_eq!(request.mutations.len(), 1);
        assert_eq!(request.table_name, "projects/p/tables/t");
    }

    #[test]
    fn bulk_entries_keep_submission_order() {
        let entries: Vec<_> = ["a", "b"]
            .into_iter()
            .map(|k| {
                MutateRowsEntry::encode(RowMutation::new(k).with(Mutation::delete_from_row()))
            })
            .collect();
        assert_eq!(entries[0].row_key, "a");
        assert_eq!(entries[1].row_key, "b");
    }

    #[test]
    fn wire_messages_round_trip_through_json() {
        let request = ReadRowsRequest {
            table_name: "t".into(),
            app_profile_id: String::new(),
            rows: RowSet::from_key("r1"),
            filter: Filter::latest(1),
            rows_limit: Some(10),
        };
        let text = serde_json::to_string(&request).unwrap();
        let back: ReadRowsRequest = serde_json::from_str(&text).unwrap();
        assert_eq!(back, request);
    }
}
