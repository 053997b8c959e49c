//! Idempotency policies: is a mutation safe to retry?

use cellstore_protocol::{CheckAndMutateRowRequest, Mutation};

/// Decides whether a mutation can be replayed without side effects beyond
/// the original intent.
///
/// The classification is computed once per mutation at submission time and
/// never recomputed; re-batching across bulk retry rounds must not change a
/// mutation's idempotency class.
pub trait IdempotentMutationPolicy: Send + Sync {
    /// Return a fresh instance with the same configuration.
    fn clone_policy(&self) -> Box<dyn IdempotentMutationPolicy>;

    /// Whether `mutation` is safe to retry.
    fn is_idempotent(&self, mutation: &Mutation) -> bool;

    /// Whether a conditional mutation request is safe to retry.
    ///
    /// Conservative by default: a conditional request observes state and
    /// mutates based on it, so replaying it can apply the wrong branch.
    fn is_idempotent_check_and_mutate(&self, _request: &CheckAndMutateRowRequest) -> bool {
        false
    }
}

/// The default policy: treat a mutation as idempotent only when replaying
/// it provably yields the same cell data.
///
/// A `SetCell` with a server-assigned timestamp produces a different cell
/// on each attempt and is therefore not idempotent; every other mutation
/// kind (explicit-timestamp sets and all deletes) is.
#[derive(Debug, Clone, Default)]
pub struct SafeIdempotentMutationPolicy;

impl IdempotentMutationPolicy for SafeIdempotentMutationPolicy {
    fn clone_policy(&self) -> Box<dyn IdempotentMutationPolicy> {
        Box::new(self.clone())
    }

    fn is_idempotent(&self, mutation: &Mutation) -> bool {
        !matches!(
            mutation,
            Mutation::SetCell {
                timestamp_micros: None,
                ..
            }
        )
    }
}

/// Treats every mutation as retryable. Useful when the application knows
/// duplicate application is harmless, e.g. all writes are absolute.
#[derive(Debug, Clone, Default)]
pub struct AlwaysRetryMutationPolicy;

impl IdempotentMutationPolicy for AlwaysRetryMutationPolicy {
    fn clone_policy(&self) -> Box<dyn IdempotentMutationPolicy> {
        Box::new(self.clone())
    }

    fn is_idempotent(&self, _mutation: &Mutation) -> bool {
        true
    }

    fn is_idempotent_check_and_mutate(&self, _request: &CheckAndMutateRowRequest) -> bool {
        true
    }
}
