//! Error types for the CellStore client
//!
//! This module provides the error hierarchy for the reliability core,
//! following Rust idioms with the `thiserror` crate. Terminal RPC failures
//! embed the wire-level [`Status`] so callers can still classify them.

use cellstore_protocol::{Status, StatusCode};
use thiserror::Error;

/// Result type alias for operations that can fail with a client error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the CellStore client.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A remote call failed terminally: either the failure was permanent, or
    /// it was transient but the retry policy's budget is exhausted, or the
    /// request was not idempotent and therefore never retried.
    #[error("rpc failed: {0}")]
    Rpc(Status),

    /// The read stream delivered malformed or inconsistent row data. Never
    /// retried and never silently dropped.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// An internal invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),

    /// The operation was abandoned before a result was produced.
    #[error("operation canceled: {0}")]
    Canceled(String),

    /// The request was rejected client-side before any remote call.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Serialization or deserialization of a wire message failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// The wire-level status embedded in this error, if any.
    pub fn status(&self) -> Option<&Status> {
        match self {
            Error::Rpc(status) => Some(status),
            _ => None,
        }
    }

    /// The status code of the underlying RPC failure, if any.
    pub fn code(&self) -> Option<StatusCode> {
        self.status().map(Status::code)
    }
}

impl From<Status> for Error {
    fn from(status: Status) -> Self {
        Error::Rpc(status)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
