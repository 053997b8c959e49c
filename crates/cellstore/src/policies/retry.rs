//! Retry policies: when is another attempt allowed?

use std::time::{Duration, Instant};

use cellstore_protocol::Status;
use tracing::debug;

use crate::transport::CallContext;

/// Decides whether an operation may make another attempt after a failure.
///
/// A retry policy is stateful: it counts failures or tracks a deadline as
/// the operation progresses. Callers obtain a fresh instance per logical
/// operation via [`RetryPolicy::clone_policy`] and drive it until it either
/// permits no further attempts or the operation succeeds.
pub trait RetryPolicy: Send + Sync {
    /// Return a fresh instance with the same configuration and reset state.
    fn clone_policy(&self) -> Box<dyn RetryPolicy>;

    /// Configure the per-attempt call context, e.g. its deadline.
    fn setup(&self, ctx: &mut CallContext);

    /// Record a failed attempt and decide whether another one is allowed.
    ///
    /// Permanent failures are never retried regardless of remaining budget.
    fn on_failure(&mut self, status: &Status) -> bool;
}

/// Permits retries until a configured number of transient failures has been
/// observed.
#[derive(Debug, Clone)]
pub struct LimitedErrorCountRetryPolicy {
    maximum_failures: u32,
    failure_count: u32,
}

impl LimitedErrorCountRetryPolicy {
    /// Permit up to `maximum_failures` transient failures; the operation
    /// makes at most `maximum_failures + 1` attempts.
    pub fn new(maximum_failures: u32) -> Self {
        Self {
            maximum_failures,
            failure_count: 0,
        }
    }
}

impl RetryPolicy for LimitedErrorCountRetryPolicy {
    fn clone_policy(&self) -> Box<dyn RetryPolicy> {
        Box::new(Self::new(self.maximum_failures))
    }

    fn setup(&self, _ctx: &mut CallContext) {
        // Attempt deadlines are left to the transport's default.
    }

    fn on_failure(&mut self, status: &Status) -> bool {
        if !status.is_transient() {
            debug!(status = %status, "permanent failure, not retrying");
            return false;
        }
        self.failure_count += 1;
        let permitted = self.failure_count <= self.maximum_failures;
        if !permitted {
            debug!(
                failures = self.failure_count,
                "retry budget exhausted, not retrying"
            );
        }
        permitted
    }
}

/// Permits retries until a configured amount of time has elapsed since the
/// operation started.
///
/// Deadlines are tracked with a monotonic clock; wall-clock adjustments do
/// not affect them. Cloning the policy restarts the clock, which is exactly
/// the clone-per-operation contract.
#[derive(Debug, Clone)]
pub struct LimitedTimeRetryPolicy {
    maximum_duration: Duration,
    deadline: Instant,
}

impl LimitedTimeRetryPolicy {
    /// Permit retries for `maximum_duration` from now.
    pub fn new(maximum_duration: Duration) -> Self {
        Self {
            maximum_duration,
            deadline: Instant::now() + maximum_duration,
        }
    }
}

impl RetryPolicy for LimitedTimeRetryPolicy {
    fn clone_policy(&self) -> Box<dyn RetryPolicy> {
        Box::new(Self::new(self.maximum_duration))
    }

    fn setup(&self, ctx: &mut CallContext) {
        ctx.set_timeout(self.deadline.saturating_duration_since(Instant::now()));
    }

    fn on_failure(&mut self, status: &Status) -> bool {
        if !status.is_transient() {
            debug!(status = %status, "permanent failure, not retrying");
            return false;
        }
        Instant::now() < self.deadline
    }
}
