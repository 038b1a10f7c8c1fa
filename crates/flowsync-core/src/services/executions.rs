//! Execution resource store
//!
//! Holds only the most recently listed page of executions. Single-execution
//! lookups, cancellation and re-execution go straight to the server and never
//! patch the cached page; it is refreshed by the next listing.

use std::cmp::Ordering;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, instrument};

use flowsync_interfaces::RemoteClient;

use crate::data::{
    ApiResult, Execution, ExecutionId, ExecutionQuery, Operation, Pagination, StoreError,
    StoreResult,
};
use crate::services::envelope::{self, settle, unwrap_data};
use crate::services::loading::InFlight;
use crate::services::routes;

/// Number of entries in [`ExecutionStore::recent_executions`].
pub const RECENT_EXECUTIONS_LIMIT: usize = 5;

/// Reactive cache of the last listed execution page.
pub struct ExecutionStore {
    client: Arc<dyn RemoteClient>,
    executions: watch::Sender<Vec<Execution>>,
    in_flight: InFlight,
}

impl ExecutionStore {
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self {
            client,
            executions: watch::channel(Vec::new()).0,
            in_flight: InFlight::new(),
        }
    }

    pub fn executions(&self) -> Vec<Execution> {
        self.executions.borrow().clone()
    }

    /// The five newest cached executions, newest first.
    ///
    /// Works on a copy; the cached page keeps the server's order. Executions
    /// without a timestamp sort last, ties keep their page order.
    pub fn recent_executions(&self) -> Vec<Execution> {
        let mut recent = self.executions();
        recent.sort_by(|a, b| match (&a.created_at, &b.created_at) {
            (Some(a), Some(b)) => b.cmp(a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        recent.truncate(RECENT_EXECUTIONS_LIMIT);
        recent
    }

    pub fn loading(&self) -> bool {
        self.in_flight.is_loading()
    }

    pub fn watch_executions(&self) -> watch::Receiver<Vec<Execution>> {
        self.executions.subscribe()
    }

    /// Outstanding request count; the store is loading while it is non-zero.
    pub fn watch_loading(&self) -> watch::Receiver<usize> {
        self.in_flight.subscribe()
    }

    pub async fn wait_idle(&self) {
        self.in_flight.wait_idle().await
    }

    /// Lists a page of executions and makes it the cached page.
    ///
    /// Pagination metadata is returned beside the data, never stored.
    #[instrument(skip(self), fields(params = query.params().len()))]
    pub async fn list_executions(&self, query: &ExecutionQuery) -> ApiResult<Vec<Execution>> {
        let _loading = self.in_flight.begin();
        match self.try_list_executions(query).await {
            Ok((page, pagination)) => ApiResult::paginated(page, pagination),
            Err(err) => settle(Operation::ListExecutions, Err(err)),
        }
    }

    async fn try_list_executions(
        &self,
        query: &ExecutionQuery,
    ) -> StoreResult<(Vec<Execution>, Option<Pagination>)> {
        let params = (!query.is_empty()).then(|| query.params());
        let response = self.client.get(routes::EXECUTIONS, params).await?;

        let pagination = envelope::pagination_of(&response.data);
        let page: Vec<Execution> = match response.data {
            Value::Array(items) => envelope::decode_records(items),
            Value::Null => Vec::new(),
            Value::Object(mut body) => match body.remove("data") {
                Some(Value::Array(items)) => envelope::decode_records(items),
                // A missing page is an empty page.
                None | Some(Value::Null) => Vec::new(),
                Some(other) => return Err(not_a_page(&other)),
            },
            other => return Err(not_a_page(&other)),
        };

        debug!("Replacing execution cache with {} executions", page.len());
        self.executions.send_replace(page.clone());
        Ok((page, pagination))
    }

    /// Detail view of one execution; read-through, not cached.
    #[instrument(skip(self), fields(execution_id = %id))]
    pub async fn get_execution(&self, id: &ExecutionId) -> ApiResult<Value> {
        let _loading = self.in_flight.begin();
        let result = self.client.get(&routes::execution_response(id), None).await;
        settle(Operation::GetExecution, result.map(|r| unwrap_data(r.data)).map_err(Into::into))
    }

    /// Cancels the remote execution. The cached page is not marked.
    #[instrument(skip(self), fields(execution_id = %id))]
    pub async fn cancel_execution(&self, id: &ExecutionId) -> ApiResult<()> {
        let _loading = self.in_flight.begin();
        let result = self.client.post(&routes::execution_cancel(id), None).await;
        settle(Operation::CancelExecution, result.map(|_| ()).map_err(Into::into))
    }

    /// Starts a new execution from a previous one's inputs.
    #[instrument(skip(self), fields(execution_id = %id))]
    pub async fn reexecute_flow(&self, id: &ExecutionId) -> ApiResult<Value> {
        let _loading = self.in_flight.begin();
        let result = self.client.post(&routes::execution_reexecute(id), None).await;
        settle(Operation::ReexecuteFlow, result.map(|r| unwrap_data(r.data)).map_err(Into::into))
    }

    #[instrument(skip(self))]
    pub async fn get_execution_stats(&self, query: &ExecutionQuery) -> ApiResult<Value> {
        let _loading = self.in_flight.begin();
        let params = (!query.is_empty()).then(|| query.params());
        let result = self.client.get(routes::EXECUTION_STATS, params).await;
        settle(Operation::ExecutionStats, result.map(|r| unwrap_data(r.data)).map_err(Into::into))
    }

    pub(crate) fn clear(&self) {
        self.executions.send_replace(Vec::new());
    }
}

fn not_a_page(payload: &Value) -> StoreError {
    StoreError::MalformedResponse(format!("execution listing is not an array: {}", payload))
}

impl std::fmt::Debug for ExecutionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionStore")
            .field("executions", &self.executions.borrow().len())
            .field("in_flight", &self.in_flight.count())
            .finish()
    }
}
