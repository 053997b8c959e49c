//! Lazy, restartable-on-retry row streaming.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use cellstore_protocol::{Filter, ReadRowsRequest, Row, RowSet};

use crate::chunk_parser::ChunkParser;
use crate::error::{Error, Result};
use crate::policies::{BackoffPolicy, RetryPolicy};
use crate::transport::{CallContext, ChunkStream, DataTransport};

/// A lazy, single-pass sequence of rows.
///
/// The underlying RPC is opened on the first poll, and each row is yielded
/// the moment it is fully reassembled, without waiting for the stream to
/// complete. When the stream breaks mid-scan and the retry policy permits,
/// the reader reopens it from the last confirmed row key (exclusive) with a
/// correspondingly reduced row limit; rows already yielded are never
/// re-yielded. Unrecoverable failures surface as the terminal element of
/// the sequence.
///
/// The sequence is not restartable from the beginning once iteration
/// starts. Dropping the reader cancels any in-flight RPC.
pub struct RowReader {
    inner: Pin<Box<dyn Stream<Item = Result<Row>> + Send>>,
}

impl RowReader {
    pub(crate) fn new(
        transport: Arc<dyn DataTransport>,
        table_name: String,
        app_profile_id: String,
        rows: RowSet,
        rows_limit: Option<u64>,
        filter: Filter,
        retry: Box<dyn RetryPolicy>,
        backoff: Box<dyn BackoffPolicy>,
    ) -> Self {
        let state = ReadRowsState {
            transport,
            table_name,
            app_profile_id,
            rows,
            filter,
            rows_limit,
            rows_yielded: 0,
            retry,
            backoff,
            parser: ChunkParser::new(),
            ready: VecDeque::new(),
            stream: None,
            done: false,
        };
        let inner = Box::pin(futures::stream::unfold(state, |mut state| async move {
            state.next_row().await.map(|item| (item, state))
        }));
        Self { inner }
    }
}

impl Stream for RowReader {
    type Item = Result<Row>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Reader internals: NotStarted -> Streaming -> Done | Failed, where
/// "NotStarted" is `stream: None` before the first open and the terminal
/// states are `done: true` (with the failure already emitted, if any).
struct ReadRowsState {
    transport: Arc<dyn DataTransport>,
    table_name: String,
    app_profile_id: String,
    /// Current position: advanced past the last confirmed row on resume.
    rows: RowSet,
    filter: Filter,
    rows_limit: Option<u64>,
    rows_yielded: u64,
    retry: Box<dyn RetryPolicy>,
    backoff: Box<dyn BackoffPolicy>,
    parser: ChunkParser,
    /// Rows reassembled but not yet yielded; one response may complete
    /// several rows.
    ready: VecDeque<Row>,
    stream: Option<ChunkStream>,
    done: bool,
}

impl ReadRowsState {
    async fn next_row(&mut self) -> Option<Result<Row>> {
        if self.done {
            return None;
        }
        loop {
            if let Some(limit) = self.rows_limit
                && self.rows_yielded >= limit
            {
                self.done = true;
                self.stream = None;
                if !self.ready.is_empty() {
                    warn!("server returned rows past the requested limit");
                    return Some(Err(Error::Internal(
                        "server returned more rows than the requested limit".into(),
                    )));
                }
                return None;
            }
            if let Some(row) = self.ready.pop_front() {
                self.rows_yielded += 1;
                return Some(Ok(row));
            }

            if self.stream.is_none() {
                match self.open_stream().await {
                    Ok(Some(stream)) => self.stream = Some(stream),
                    Ok(None) => {
                        // The row set was fully consumed by advancement.
                        self.done = true;
                        return None;
                    }
                    Err(error) => {
                        self.done = true;
                        return Some(Err(error));
                    }
                }
            }

            let next = match self.stream.as_mut() {
                Some(stream) => stream.next().await,
                None => continue,
            };
            match next {
                Some(Ok(response)) => {
                    for chunk in response.chunks {
                        match self.parser.handle_chunk(chunk) {
                            Ok(Some(row)) => self.ready.push_back(row),
                            Ok(None) => {}
                            Err(error) => {
                                // Malformed stream data is never retried.
                                self.done = true;
                                self.stream = None;
                                return Some(Err(error));
                            }
                        }
                    }
                    if let Some(key) = response.last_scanned_row_key.as_deref() {
                        self.parser.note_last_scanned(key);
                    }
                }
                Some(Err(status)) => {
                    self.stream = None;
                    self.parser.cancel_row();
                    if !self.retry.on_failure(&status) {
                        self.done = true;
                        return Some(Err(Error::Rpc(status)));
                    }
                    let delay = self.backoff.on_completion(&status);
                    debug!(
                        status = %status,
                        delay_ms = delay.as_millis() as u64,
                        "read stream broke, backing off before resuming"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    self.stream = None;
                    self.done = true;
                    if let Err(error) = self.parser.handle_end_of_stream() {
                        return Some(Err(error));
                    }
                    return None;
                }
            }
        }
    }

    /// Open (or reopen) the server stream at the current position.
    ///
    /// Returns `Ok(None)` when advancement has exhausted the row set, i.e.
    /// every requested row was already confirmed before the break.
    async fn open_stream(&mut self) -> Result<Option<ChunkStream>> {
        if let Some(last) = self.parser.last_committed_key() {
            let advanced = self.rows.clone().advance_past(last);
            if advanced.is_empty() {
                return Ok(None);
            }
            self.rows = advanced;
        }
        let request = ReadRowsRequest {
            table_name: self.table_name.clone(),
            app_profile_id: self.app_profile_id.clone(),
            rows: self.rows.clone(),
            filter: self.filter.clone(),
            rows_limit: self.rows_limit.map(|limit| limit - self.rows_yielded),
        };

        loop {
            let mut ctx = CallContext::new();
            self.retry.setup(&mut ctx);
            match self.transport.read_rows(&ctx, request.clone()).await {
                Ok(stream) => return Ok(Some(stream)),
                Err(status) => {
                    if !self.retry.on_failure(&status) {
                        warn!(status = %status, "could not open read stream");
                        return Err(Error::Rpc(status));
                    }
                    let delay = self.backoff.on_completion(&status);
                    debug!(
                        status = %status,
                        delay_ms = delay.as_millis() as u64,
                        "read stream open failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
