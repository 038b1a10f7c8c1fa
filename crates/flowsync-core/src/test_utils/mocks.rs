//! Scripted in-memory transport
//!
//! `MockRemoteClient` answers requests from per-route queues of scripted
//! responses and records every request it sees. A response can also be held
//! behind a [`ResponseGate`] so a test decides when, and in which order,
//! concurrent requests resolve.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use flowsync_interfaces::{
    HttpMethod, QueryParams, RemoteClient, RemoteResponse, TransportError, TransportResult,
};

/// A request as the transport received it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: HttpMethod,
    pub path: String,
    pub params: Option<QueryParams>,
    pub body: Option<Value>,
}

enum Scripted {
    Ready(TransportResult<RemoteResponse>),
    Gated(oneshot::Receiver<TransportResult<RemoteResponse>>),
}

/// Releases one held response.
#[derive(Debug)]
pub struct ResponseGate {
    tx: oneshot::Sender<TransportResult<RemoteResponse>>,
}

impl ResponseGate {
    pub fn release(self, result: TransportResult<RemoteResponse>) {
        // The request may already have been abandoned.
        let _ = self.tx.send(result);
    }

    pub fn release_json(self, body: Value) {
        self.release(Ok(RemoteResponse::ok(body)));
    }

    pub fn release_error(self, error: TransportError) {
        self.release(Err(error));
    }
}

#[derive(Default)]
pub struct MockRemoteClient {
    scripts: Mutex<HashMap<(HttpMethod, String), VecDeque<Scripted>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockRemoteClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: HttpMethod, path: &str, scripted: Scripted) {
        self.scripts
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(scripted);
    }

    /// Queues a response for the next `method path` request.
    pub fn respond(&self, method: HttpMethod, path: &str, result: TransportResult<RemoteResponse>) -> &Self {
        self.push(method, path, Scripted::Ready(result));
        self
    }

    pub fn respond_json(&self, method: HttpMethod, path: &str, body: Value) -> &Self {
        self.respond(method, path, Ok(RemoteResponse::ok(body)))
    }

    pub fn fail(&self, method: HttpMethod, path: &str, error: TransportError) -> &Self {
        self.respond(method, path, Err(error))
    }

    pub fn fail_with_status(&self, method: HttpMethod, path: &str, status: u16, body: Value) -> &Self {
        self.fail(method, path, TransportError::status(status, body))
    }

    /// Queues a response that is held until the returned gate is released.
    pub fn gate(&self, method: HttpMethod, path: &str) -> ResponseGate {
        let (tx, rx) = oneshot::channel();
        self.push(method, path, Scripted::Gated(rx));
        ResponseGate { tx }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_to(&self, method: HttpMethod, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    async fn handle(
        &self,
        method: HttpMethod,
        path: &str,
        params: Option<&QueryParams>,
        body: Option<Value>,
    ) -> TransportResult<RemoteResponse> {
        self.requests.lock().push(RecordedRequest {
            method,
            path: path.to_string(),
            params: params.cloned(),
            body,
        });

        let scripted = self
            .scripts
            .lock()
            .get_mut(&(method, path.to_string()))
            .and_then(VecDeque::pop_front);

        match scripted {
            Some(Scripted::Ready(result)) => result,
            Some(Scripted::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(TransportError::Other(format!("gate for {} {} was dropped", method, path)))),
            None => Err(TransportError::Other(format!("no scripted response for {} {}", method, path))),
        }
    }
}

#[async_trait]
impl RemoteClient for MockRemoteClient {
    async fn get(&self, path: &str, params: Option<&QueryParams>) -> TransportResult<RemoteResponse> {
        self.handle(HttpMethod::Get, path, params, None).await
    }

    async fn post(&self, path: &str, body: Option<Value>) -> TransportResult<RemoteResponse> {
        self.handle(HttpMethod::Post, path, None, body).await
    }

    async fn put(&self, path: &str, body: Value) -> TransportResult<RemoteResponse> {
        self.handle(HttpMethod::Put, path, None, Some(body)).await
    }

    async fn delete(&self, path: &str) -> TransportResult<RemoteResponse> {
        self.handle(HttpMethod::Delete, path, None, None).await
    }
}
