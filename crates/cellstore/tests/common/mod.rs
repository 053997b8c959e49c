//! Shared test support: a scripted in-memory transport.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use futures::StreamExt;

use cellstore::{CallContext, ChunkStream, DataTransport, Status};
use cellstore_protocol::{
    CheckAndMutateRowRequest, CheckAndMutateRowResponse, MutateRowRequest, MutateRowResponse,
    MutateRowsRequest, MutateRowsResponse, ReadRowsRequest, ReadRowsResponse,
};

/// One scripted read stream: either an open failure or a sequence of
/// stream items delivered in order.
pub type StreamScript = Result<Vec<Result<ReadRowsResponse, Status>>, Status>;

/// A transport that replays scripted responses and records what it saw.
#[derive(Default)]
pub struct FakeTransport {
    mutate_row_responses: Mutex<VecDeque<Result<MutateRowResponse, Status>>>,
    mutate_row_calls: AtomicU32,
    mutate_rows_responses: Mutex<VecDeque<Result<MutateRowsResponse, Status>>>,
    mutate_rows_calls: AtomicU32,
    read_rows_scripts: Mutex<VecDeque<StreamScript>>,
    read_rows_requests: Mutex<Vec<ReadRowsRequest>>,
    check_and_mutate_responses: Mutex<VecDeque<Result<CheckAndMutateRowResponse, Status>>>,
    check_and_mutate_calls: AtomicU32,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_mutate_row(&self, response: Result<MutateRowResponse, Status>) {
        self.mutate_row_responses.lock().unwrap().push_back(response);
    }

    pub fn push_mutate_rows(&self, response: Result<MutateRowsResponse, Status>) {
        self.mutate_rows_responses.lock().unwrap().push_back(response);
    }

    pub fn push_read_rows_stream(&self, script: StreamScript) {
        self.read_rows_scripts.lock().unwrap().push_back(script);
    }

    pub fn push_check_and_mutate(&self, response: Result<CheckAndMutateRowResponse, Status>) {
        self.check_and_mutate_responses
            .lock()
            .unwrap()
            .push_back(response);
    }

    pub fn mutate_row_calls(&self) -> u32 {
        self.mutate_row_calls.load(Ordering::SeqCst)
    }

    pub fn mutate_rows_calls(&self) -> u32 {
        self.mutate_rows_calls.load(Ordering::SeqCst)
    }

    pub fn check_and_mutate_calls(&self) -> u32 {
        self.check_and_mutate_calls.load(Ordering::SeqCst)
    }

    /// The `ReadRows` requests issued so far, in order.
    pub fn read_rows_requests(&self) -> Vec<ReadRowsRequest> {
        self.read_rows_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataTransport for FakeTransport {
    async fn mutate_row(
        &self,
        _ctx: &CallContext,
        _request: MutateRowRequest,
    ) -> Result<MutateRowResponse, Status> {
        self.mutate_row_calls.fetch_add(1, Ordering::SeqCst);
        self.mutate_row_responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected mutate_row call")
    }

    async fn mutate_rows(
        &self,
        _ctx: &CallContext,
        _request: MutateRowsRequest,
    ) -> Result<MutateRowsResponse, Status> {
        self.mutate_rows_calls.fetch_add(1, Ordering::SeqCst);
        self.mutate_rows_responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected mutate_rows call")
    }

    async fn read_rows(
        &self,
        _ctx: &CallContext,
        request: ReadRowsRequest,
    ) -> Result<ChunkStream, Status> {
        self.read_rows_requests.lock().unwrap().push(request);
        let script = self
            .read_rows_scripts
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected read_rows call");
        script.map(|items| futures::stream::iter(items).boxed())
    }

    async fn check_and_mutate_row(
        &self,
        _ctx: &CallContext,
        _request: CheckAndMutateRowRequest,
    ) -> Result<CheckAndMutateRowResponse, Status> {
        self.check_and_mutate_calls.fetch_add(1, Ordering::SeqCst);
        self.check_and_mutate_responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected check_and_mutate_row call")
    }
}
