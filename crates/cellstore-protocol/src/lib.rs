//! Shared protocol types and wire messages for the CellStore data API
//!
//! This crate provides the data model used by the `cellstore` client: logical
//! mutations, rows, row sets and filters, plus the wire request/response
//! messages exchanged with the service. By keeping these types in their own
//! crate, the reliability core and any transport implementation agree on a
//! single definition of the wire surface.
//!
//! # Type Organization
//!
//! - **Status codes**: [`status`] - RPC status codes and transient/permanent classification
//! - **Mutations**: [`mutation`] - Cell-level mutations, row mutations, bulk batches
//! - **Rows**: [`row`] - Rows and cells produced by read operations
//! - **Selection**: [`rowset`], [`filter`] - Which rows and cells a read targets
//! - **Wire messages**: [`messages`] - Request/response values for each remote operation
//!
//! # Design Principles
//!
//! - **Zero I/O**: All types are pure data structures
//! - **Serialization**: serde-based throughout
//! - **Move semantics**: mutation data is consumed when encoded into a request
//!   and cannot be reused afterwards

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod filter;
pub mod messages;
pub mod mutation;
pub mod row;
pub mod rowset;
pub mod status;

// Re-export commonly used types at crate level
pub use filter::Filter;
pub use messages::{
    CellChunk, CheckAndMutateRowRequest, CheckAndMutateRowResponse, MutateRowRequest,
    MutateRowResponse, MutateRowsEntry, MutateRowsRequest, MutateRowsResponse, MutateRowsResult,
    ReadRowsRequest, ReadRowsResponse, RowStatus,
};
pub use mutation::{BulkMutation, FailedMutation, Mutation, RowMutation, TimestampRange};
pub use row::{Cell, Row};
pub use rowset::{RowRange, RowSet};
pub use status::{Status, StatusCode};
