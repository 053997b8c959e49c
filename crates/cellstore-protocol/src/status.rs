//! RPC status codes returned by the CellStore service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical status codes for remote operations.
///
/// These mirror the gRPC code set; the service reports one of these for every
/// unary call and for every entry of a bulk mutation response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    /// The operation completed successfully.
    Ok,
    /// The operation was cancelled, typically by the caller.
    Cancelled,
    /// Unknown error.
    Unknown,
    /// The client specified an invalid argument.
    InvalidArgument,
    /// The deadline expired before the operation could complete.
    DeadlineExceeded,
    /// The requested entity was not found.
    NotFound,
    /// The entity the client attempted to create already exists.
    AlreadyExists,
    /// The caller does not have permission to execute the operation.
    PermissionDenied,
    /// A per-user or per-service quota has been exhausted.
    ResourceExhausted,
    /// The system is not in a state required for the operation.
    FailedPrecondition,
    /// The operation was aborted, typically due to a concurrency conflict.
    Aborted,
    /// The operation was attempted past the valid range.
    OutOfRange,
    /// Internal error in the service.
    Internal,
    /// The service is currently unavailable.
    Unavailable,
    /// Unrecoverable data loss or corruption.
    DataLoss,
    /// The request does not have valid authentication credentials.
    Unauthenticated,
}

impl StatusCode {
    /// Whether a failure with this code is transient and therefore a retry
    /// candidate (still subject to the idempotency rule and policy budget).
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            StatusCode::Aborted
                | StatusCode::DeadlineExceeded
                | StatusCode::ResourceExhausted
                | StatusCode::Unavailable
        )
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusCode::Ok => "OK",
            StatusCode::Cancelled => "CANCELLED",
            StatusCode::Unknown => "UNKNOWN",
            StatusCode::InvalidArgument => "INVALID_ARGUMENT",
            StatusCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            StatusCode::NotFound => "NOT_FOUND",
            StatusCode::AlreadyExists => "ALREADY_EXISTS",
            StatusCode::PermissionDenied => "PERMISSION_DENIED",
            StatusCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            StatusCode::FailedPrecondition => "FAILED_PRECONDITION",
            StatusCode::Aborted => "ABORTED",
            StatusCode::OutOfRange => "OUT_OF_RANGE",
            StatusCode::Internal => "INTERNAL",
            StatusCode::Unavailable => "UNAVAILABLE",
            StatusCode::DataLoss => "DATA_LOSS",
            StatusCode::Unauthenticated => "UNAUTHENTICATED",
        };
        f.write_str(name)
    }
}

/// The outcome of a remote call or of a single entry within a bulk call.
///
/// A `Status` is a plain value: it travels on the wire in per-entry bulk
/// results and is embedded in the client's error type for terminal failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    code: StatusCode,
    message: String,
}

impl Status {
    /// Create a status with the given code and message.
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The OK status.
    pub fn ok() -> Self {
        Self {
            code: StatusCode::Ok,
            message: String::new(),
        }
    }

    /// The status code.
    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// The human-readable message, possibly empty.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether this status represents success.
    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok
    }

    /// Whether a failure with this status is a retry candidate.
    pub fn is_transient(&self) -> bool {
        self.code.is_transient()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StatusCode::Aborted, true)]
    #[case(StatusCode::DeadlineExceeded, true)]
    #[case(StatusCode::ResourceExhausted, true)]
    #[case(StatusCode::Unavailable, true)]
    #[case(StatusCode::Ok, false)]
    #[case(StatusCode::InvalidArgument, false)]
    #[case(StatusCode::NotFound, false)]
    #[case(StatusCode::FailedPrecondition, false)]
    #[case(StatusCode::Internal, false)]
    #[case(StatusCode::Unknown, false)]
    fn transient_classification(#[case] code: StatusCode, #[case] transient: bool) {
        assert_eq!(code.is_transient(), transient);
    }

    #[test]
    fn display_includes_message() {
        let status = Status::new(StatusCode::Unavailable, "try again");
        assert_eq!(status.to_string(), "UNAVAILABLE: try again");
        assert_eq!(Status::ok().to_string(), "OK");
    }
}
