//! Working-set tracking for bulk mutations across retry rounds.

use cellstore_protocol::{
    BulkMutation, FailedMutation, MutateRowsEntry, MutateRowsRequest, Mutation, Status, StatusCode,
};
use tracing::{debug, warn};

use crate::policies::IdempotentMutationPolicy;
use crate::transport::{CallContext, DataTransport};

/// One not-yet-resolved mutation of the submitted batch.
struct PendingMutation {
    original_index: usize,
    row_key: String,
    mutations: Vec<Mutation>,
    /// Computed once at submission time and never recomputed, so the
    /// retry classification cannot drift between rounds.
    is_idempotent: bool,
    last_status: Option<Status>,
}

/// Tracks a bulk mutation across sequential request rounds.
///
/// The mutator owns the working set of pending mutations. Each round
/// encodes the *current* working set into one fresh wire request; per-entry
/// outcomes shrink the set, and an individual mutation may reappear across
/// sequential rounds but is never in two in-flight requests at once. The
/// indices across {succeeded, pending, failed} always partition the
/// original submission exactly.
///
/// The driver loop (retry policy consultation and backoff sleeps between
/// rounds) belongs to the caller, not the mutator.
pub(crate) struct BulkMutator {
    table_name: String,
    app_profile_id: String,
    pending: Vec<PendingMutation>,
    failures: Vec<FailedMutation>,
}

impl BulkMutator {
    pub(crate) fn new(
        table_name: impl Into<String>,
        app_profile_id: impl Into<String>,
        idempotent_policy: &dyn IdempotentMutationPolicy,
        mutations: BulkMutation,
    ) -> Self {
        let pending = mutations
            .into_mutations()
            .into_iter()
            .enumerate()
            .map(|(original_index, row_mutation)| {
                let is_idempotent = row_mutation
                    .mutations()
                    .iter()
                    .all(|m| idempotent_policy.is_idempotent(m));
                let (row_key, mutations) = row_mutation.into_parts();
                PendingMutation {
                    original_index,
                    row_key,
                    mutations,
                    is_idempotent,
                    last_status: None,
                }
            })
            .collect();
        Self {
            table_name: table_name.into(),
            app_profile_id: app_profile_id.into(),
            pending,
            failures: Vec::new(),
        }
    }

    /// Whether any mutation is still awaiting resolution.
    pub(crate) fn has_pending_mutations(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Encode the current working set into one request, issue it, and fold
    /// the per-entry outcomes back into the working set.
    ///
    /// Returns `Err` with a representative status when the round left work
    /// unfinished or produced new failures; the caller's retry policy
    /// decides whether another round is allowed.
    pub(crate) async fn make_one_request(
        &mut self,
        transport: &dyn DataTransport,
        ctx: &CallContext,
    ) -> Result<(), Status> {
        // A fresh request every round; mutation data is cloned out of the
        // working set, never shared with a previous round's request.
        let request = MutateRowsRequest {
            table_name: self.table_name.clone(),
            app_profile_id: self.app_profile_id.clone(),
            entries: self
                .pending
                .iter()
                .map(|p| MutateRowsEntry {
                    row_key: p.row_key.clone(),
                    mutations: p.mutations.clone(),
                })
                .collect(),
        };
        debug!(entries = request.entries.len(), "issuing bulk mutation round");

        match transport.mutate_rows(ctx, request).await {
            Ok(response) => self.absorb_round(response.entries),
            Err(status) => {
                // Whole-RPC failure: every pending entry saw this status.
                // A batch round that fails entirely still preserves the
                // partial successes of earlier rounds.
                warn!(status = %status, "bulk mutation round failed entirely");
                let mut keep = Vec::with_capacity(self.pending.len());
                for mut p in self.pending.drain(..) {
                    p.last_status = Some(status.clone());
                    if p.is_idempotent {
                        keep.push(p);
                    } else {
                        self.failures
                            .push(FailedMutation::new(p.original_index, status.clone()));
                    }
                }
                self.pending = keep;
                Err(status)
            }
        }
    }

    /// Fold per-entry statuses into the working set.
    fn absorb_round(
        &mut self,
        results: Vec<cellstore_protocol::MutateRowsResult>,
    ) -> Result<(), Status> {
        let round_size = self.pending.len();
        let mut outcomes: Vec<Option<Status>> = vec![None; round_size];
        for result in results {
            if result.index >= round_size {
                warn!(index = result.index, "bulk response entry out of range");
                continue;
            }
            outcomes[result.index] = Some(result.status);
        }

        let unreported = || {
            Status::new(
                StatusCode::Internal,
                "mutation was not reported by the server",
            )
        };

        let mut round_status: Option<Status> = None;
        let mut keep = Vec::with_capacity(round_size);
        for (mut p, outcome) in self.pending.drain(..).zip(outcomes) {
            let status = outcome.unwrap_or_else(unreported);
            if status.is_ok() {
                continue;
            }
            if p.is_idempotent && status.is_transient() {
                p.last_status = Some(status.clone());
                round_status = Some(status);
                keep.push(p);
            } else {
                round_status.get_or_insert_with(|| status.clone());
                self.failures
                    .push(FailedMutation::new(p.original_index, status));
            }
        }
        self.pending = keep;

        match round_status {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }

    /// Terminate the batch and return the final failure list, sorted by
    /// original submission index.
    ///
    /// Mutations still pending when the caller stops retrying are failed
    /// with the last status the transport reported for them.
    pub(crate) fn into_final_failures(mut self) -> Vec<FailedMutation> {
        for p in self.pending.drain(..) {
            let status = p.last_status.unwrap_or_else(|| {
                Status::new(StatusCode::Unknown, "mutation was never attempted")
            });
            self.failures.push(FailedMutation::new(p.original_index, status));
        }
        self.failures.sort_by_key(|f| f.index);
        self.failures
    }
}
