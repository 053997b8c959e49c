//! Transport trait and per-call context
//!
//! Defines the generic [`DataTransport`] trait the reliability core drives.
//! A transport exposes one method per remote operation, in unary and
//! server-streaming shapes; how requests reach the service (gRPC, HTTP,
//! an in-process fake) is entirely the implementation's concern.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;

use cellstore_protocol::{
    CheckAndMutateRowRequest, CheckAndMutateRowResponse, MutateRowRequest, MutateRowResponse,
    MutateRowsRequest, MutateRowsResponse, ReadRowsRequest, ReadRowsResponse, Status,
};

/// Per-call context: deadline and attempt metadata for one RPC attempt.
///
/// A fresh context is built for every attempt; retry policies configure it
/// via [`RetryPolicy::setup`](crate::policies::RetryPolicy::setup) before
/// the call is issued.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    timeout: Option<Duration>,
}

impl CallContext {
    /// A context with no deadline configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound this attempt to `timeout`. Transports should abort the call
    /// with `DEADLINE_EXCEEDED` once it elapses.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    /// The attempt deadline, if one was configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// A server stream of read responses.
///
/// Dropping the stream cancels the underlying RPC.
pub type ChunkStream = BoxStream<'static, std::result::Result<ReadRowsResponse, Status>>;

/// One method per remote operation of the CellStore data API.
///
/// The client shares a single transport across concurrent operations;
/// implementations must be safe to call from multiple tasks at once.
/// Failures are reported as wire-level [`Status`] values, which the core
/// classifies as transient or permanent.
#[async_trait]
pub trait DataTransport: Send + Sync {
    /// Apply one row mutation atomically.
    async fn mutate_row(
        &self,
        ctx: &CallContext,
        request: MutateRowRequest,
    ) -> std::result::Result<MutateRowResponse, Status>;

    /// Apply a batch of independent row mutations, with per-entry outcomes.
    async fn mutate_rows(
        &self,
        ctx: &CallContext,
        request: MutateRowsRequest,
    ) -> std::result::Result<MutateRowsResponse, Status>;

    /// Open a server stream of row data for the requested row set.
    async fn read_rows(
        &self,
        ctx: &CallContext,
        request: ReadRowsRequest,
    ) -> std::result::Result<ChunkStream, Status>;

    /// Conditionally mutate one row based on a predicate filter.
    async fn check_and_mutate_row(
        &self,
        ctx: &CallContext,
        request: CheckAndMutateRowRequest,
    ) -> std::result::Result<CheckAndMutateRowResponse, Status>;
}
