//! # CellStore client
//!
//! Client-side reliability core for the CellStore tabular data API:
//! - Single and bulk mutations with retry/backoff under pluggable policies
//! - Idempotency-aware partial-failure tracking across bulk batches
//! - Streamed row reassembly with resume-after-break semantics
//! - A one-shot deferred bridge for running operations on an executor
//!
//! The transport is an injected collaborator: anything implementing
//! [`DataTransport`] (gRPC, HTTP, an in-process fake) can back a client.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cellstore::{Client, DataTransport, Mutation, RowMutation};
//!
//! async fn example(transport: Arc<dyn DataTransport>) -> cellstore::Result<()> {
//!     let client = Client::new(transport);
//!     let table = client.table("projects/demo/tables/metrics");
//!
//!     let mutation = RowMutation::new("row-1")
//!         .with(Mutation::set_cell("fam", "col", 1_000, "value"));
//!     table.apply(mutation).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// Re-export commonly used types
pub use client::Client;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use deferred::Deferred;
pub use error::{Error, Result};
pub use read_rows::RowReader;
pub use table::Table;
pub use transport::{CallContext, ChunkStream, DataTransport};

// Protocol types, re-exported for convenience
pub use cellstore_protocol::{
    BulkMutation, Cell, FailedMutation, Filter, Mutation, Row, RowMutation, RowRange, RowSet,
    Status, StatusCode,
};

// Module declarations
mod bulk;
pub mod client;
pub mod config;
pub mod deferred;
pub mod error;
pub mod policies;
pub mod read_rows;
mod retry_loop;
pub mod table;
pub mod transport;

mod chunk_parser;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::policies::{
        AlwaysRetryMutationPolicy, BackoffPolicy, ExponentialBackoffPolicy,
        IdempotentMutationPolicy, LimitedErrorCountRetryPolicy, LimitedTimeRetryPolicy,
        RetryPolicy, SafeIdempotentMutationPolicy,
    };
    pub use crate::{
        BulkMutation, Client, ClientConfig, DataTransport, Error, FailedMutation, Filter,
        Mutation, Result, Row, RowMutation, RowReader, RowSet, Status, StatusCode, Table,
    };
}

/// Crate version, from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
