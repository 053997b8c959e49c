//! Retry, backoff, and idempotency policies.
//!
//! Policies are pure decision logic with no I/O. Each logical operation
//! clones the policies it needs exactly once, so attempt-counting and
//! backoff state persist across the attempts of that operation but never
//! leak between unrelated operations. Concurrent calls therefore need no
//! locking around policy state.

mod backoff;
mod idempotency;
mod retry;

pub use backoff::{BackoffPolicy, ExponentialBackoffPolicy, ExponentialBackoffPolicyBuilder};
pub use idempotency::{
    AlwaysRetryMutationPolicy, IdempotentMutationPolicy, SafeIdempotentMutationPolicy,
};
pub use retry::{LimitedErrorCountRetryPolicy, LimitedTimeRetryPolicy, RetryPolicy};
