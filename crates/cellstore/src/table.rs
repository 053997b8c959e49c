//! Per-table operation surface: apply, bulk apply, reads, conditional writes.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, warn};

use cellstore_protocol::{
    BulkMutation, CheckAndMutateRowRequest, FailedMutation, Filter, MutateRowRequest, Mutation,
    Row, RowMutation, RowSet,
};

use crate::bulk::BulkMutator;
use crate::client::Client;
use crate::deferred::{Deferred, spawn_deferred};
use crate::error::{Error, Result};
use crate::policies::{BackoffPolicy, IdempotentMutationPolicy, RetryPolicy};
use crate::read_rows::RowReader;
use crate::retry_loop::retry_unary;
use crate::transport::CallContext;

/// The operations of one table.
///
/// A `Table` is cheap to create and cheap to clone; it shares the client's
/// transport and carries its own policy prototypes, which are cloned once
/// per logical operation. Independent operations may run concurrently; the
/// table itself holds no per-operation state.
pub struct Table {
    client: Client,
    table_name: String,
    retry: Box<dyn RetryPolicy>,
    backoff: Box<dyn BackoffPolicy>,
    idempotency: Box<dyn IdempotentMutationPolicy>,
}

impl Clone for Table {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            table_name: self.table_name.clone(),
            retry: self.retry.clone_policy(),
            backoff: self.backoff.clone_policy(),
            idempotency: self.idempotency.clone_policy(),
        }
    }
}

impl Table {
    pub(crate) fn new(client: Client, table_name: String) -> Self {
        let config = client.config();
        let retry = config.retry.clone_policy();
        let backoff = config.backoff.clone_policy();
        let idempotency = config.idempotency.clone_policy();
        Self {
            client,
            table_name,
            retry,
            backoff,
            idempotency,
        }
    }

    /// The fully qualified table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Override the retry policy for operations on this table handle.
    pub fn with_retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.retry = Box::new(policy);
        self
    }

    /// Override the backoff policy for operations on this table handle.
    pub fn with_backoff_policy(mut self, policy: impl BackoffPolicy + 'static) -> Self {
        self.backoff = Box::new(policy);
        self
    }

    /// Override the idempotency policy for operations on this table handle.
    pub fn with_idempotent_mutation_policy(
        mut self,
        policy: impl IdempotentMutationPolicy + 'static,
    ) -> Self {
        self.idempotency = Box::new(policy);
        self
    }

    /// Apply one row mutation, retrying transient failures under policy
    /// control.
    ///
    /// The request is retried only when *every* constituent mutation is
    /// idempotent; a single non-idempotent mutation makes the whole request
    /// non-retryable, whatever failure code the transport reports. The
    /// attempt loop is strictly sequential.
    #[tracing::instrument(skip(self, mutation), fields(table = %self.table_name, row_key = %mutation.row_key()))]
    pub async fn apply(&self, mutation: RowMutation) -> Result<()> {
        if mutation.is_empty() {
            return Err(Error::InvalidRequest("mutation has no operations".into()));
        }
        // Fresh policy instances for this operation; policy state advances
        // as the operation makes (or fails to make) progress.
        let mut retry = self.retry.clone_policy();
        let mut backoff = self.backoff.clone_policy();
        let idempotency = self.idempotency.clone_policy();

        let request = MutateRowRequest::encode(
            self.table_name.clone(),
            self.client.config().app_profile_id.clone(),
            mutation,
        );
        let is_idempotent = request
            .mutations
            .iter()
            .all(|m| idempotency.is_idempotent(m));

        loop {
            let mut ctx = CallContext::new();
            retry.setup(&mut ctx);
            match self.client.transport().mutate_row(&ctx, request.clone()).await {
                Ok(_) => return Ok(()),
                Err(status) => {
                    if !retry.on_failure(&status) || !is_idempotent {
                        warn!(
                            status = %status,
                            is_idempotent,
                            "permanent (or too many transient) errors in apply"
                        );
                        return Err(Error::Rpc(status));
                    }
                    let delay = backoff.on_completion(&status);
                    debug!(delay_ms = delay.as_millis() as u64, "retrying apply");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Like [`Table::apply`], but runs on the supplied executor and returns
    /// a handle resolved exactly once with the final outcome.
    pub fn spawn_apply(&self, executor: &Handle, mutation: RowMutation) -> Deferred<()> {
        let table = self.clone();
        spawn_deferred(executor, async move { table.apply(mutation).await })
    }

    /// Apply a batch of independent row mutations.
    ///
    /// Always returns a (possibly empty) failure list rather than aborting
    /// the whole batch: partial success is preserved, and the caller must
    /// inspect the list to know which rows did not update. The list is
    /// sorted by original submission index.
    #[tracing::instrument(skip(self, mutations), fields(table = %self.table_name, batch_size = mutations.len()))]
    pub async fn bulk_apply(&self, mutations: BulkMutation) -> Vec<FailedMutation> {
        if mutations.is_empty() {
            return Vec::new();
        }
        let mut retry = self.retry.clone_policy();
        let mut backoff = self.backoff.clone_policy();
        let idempotency = self.idempotency.clone_policy();

        let mut mutator = BulkMutator::new(
            self.table_name.clone(),
            self.client.config().app_profile_id.clone(),
            idempotency.as_ref(),
            mutations,
        );
        while mutator.has_pending_mutations() {
            let mut ctx = CallContext::new();
            retry.setup(&mut ctx);
            if let Err(status) = mutator.make_one_request(self.client.transport(), &ctx).await {
                if !mutator.has_pending_mutations() {
                    break;
                }
                if !retry.on_failure(&status) {
                    debug!(status = %status, "bulk retry budget exhausted");
                    break;
                }
                let delay = backoff.on_completion(&status);
                debug!(delay_ms = delay.as_millis() as u64, "retrying bulk round");
                tokio::time::sleep(delay).await;
            }
        }
        mutator.into_final_failures()
    }

    /// Like [`Table::bulk_apply`], but runs on the supplied executor and
    /// returns a handle resolved exactly once with the failure list.
    pub fn spawn_bulk_apply(
        &self,
        executor: &Handle,
        mutations: BulkMutation,
    ) -> Deferred<Vec<FailedMutation>> {
        let table = self.clone();
        spawn_deferred(executor, async move { Ok(table.bulk_apply(mutations).await) })
    }

    /// Stream every row selected by `rows`, filtered server-side.
    pub fn read_rows(&self, rows: RowSet, filter: Filter) -> RowReader {
        self.new_reader(rows, None, filter)
    }

    /// Stream at most `rows_limit` rows selected by `rows`.
    ///
    /// A limit of zero means unbounded.
    pub fn read_rows_with_limit(&self, rows: RowSet, rows_limit: u64, filter: Filter) -> RowReader {
        let limit = (rows_limit != 0).then_some(rows_limit);
        self.new_reader(rows, limit, filter)
    }

    /// Read a single row; `Ok(None)` when the row does not exist.
    pub async fn read_row(
        &self,
        row_key: impl Into<String>,
        filter: Filter,
    ) -> Result<Option<Row>> {
        use futures::StreamExt;

        let mut reader = self.read_rows_with_limit(RowSet::from_key(row_key), 1, filter);
        let Some(first) = reader.next().await else {
            return Ok(None);
        };
        let row = first?;
        if reader.next().await.is_some() {
            return Err(Error::Internal(
                "read_row received more than one row for a single-key request".into(),
            ));
        }
        Ok(Some(row))
    }

    /// Conditionally mutate `row_key`: apply `true_mutations` when the
    /// predicate filter matches at least one cell, `false_mutations`
    /// otherwise. Returns whether the predicate matched.
    ///
    /// Conditional mutations are treated as non-idempotent unless the
    /// idempotency policy explicitly says otherwise, so with the default
    /// policy a transient failure is surfaced rather than retried.
    #[tracing::instrument(skip_all, fields(table = %self.table_name))]
    pub async fn check_and_mutate_row(
        &self,
        row_key: impl Into<String>,
        predicate_filter: Filter,
        true_mutations: Vec<Mutation>,
        false_mutations: Vec<Mutation>,
    ) -> Result<bool> {
        let request = CheckAndMutateRowRequest {
            table_name: self.table_name.clone(),
            app_profile_id: self.client.config().app_profile_id.clone(),
            row_key: row_key.into(),
            predicate_filter,
            true_mutations,
            false_mutations,
        };
        let is_idempotent = self.idempotency.is_idempotent_check_and_mutate(&request);
        let transport = self.client.transport_arc();
        let response = retry_unary(
            self.retry.clone_policy(),
            self.backoff.clone_policy(),
            is_idempotent,
            "check_and_mutate_row",
            move |ctx| {
                let transport = Arc::clone(&transport);
                let request = request.clone();
                async move { transport.check_and_mutate_row(&ctx, request).await }
            },
        )
        .await?;
        Ok(response.predicate_matched)
    }

    fn new_reader(&self, rows: RowSet, rows_limit: Option<u64>, filter: Filter) -> RowReader {
        RowReader::new(
            self.client.transport_arc(),
            self.table_name.clone(),
            self.client.config().app_profile_id.clone(),
            rows,
            rows_limit,
            filter,
            self.retry.clone_policy(),
            self.backoff.clone_policy(),
        )
    }
}
