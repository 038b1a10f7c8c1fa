//! Flow resource store
//!
//! Caches the flow collection and the currently selected flow, and keeps both
//! consistent with what the server returns. Collections live in tokio `watch`
//! channels so consumers can either read a snapshot or subscribe to changes.

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::{debug, instrument};

use flowsync_interfaces::RemoteClient;

use crate::data::{
    ApiResult, ExecuteFlowPayload, Flow, FlowId, FlowInput, Operation, Pagination, StoreResult,
};
use crate::services::envelope::{self, settle, unwrap_data};
use crate::services::loading::InFlight;
use crate::services::routes;

/// Reactive cache of flows backed by a [`RemoteClient`].
pub struct FlowStore {
    client: Arc<dyn RemoteClient>,
    flows: watch::Sender<Vec<Flow>>,
    current_flow: watch::Sender<Option<Flow>>,
    in_flight: InFlight,
}

impl FlowStore {
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self {
            client,
            flows: watch::channel(Vec::new()).0,
            current_flow: watch::channel(None).0,
            in_flight: InFlight::new(),
        }
    }

    // --- views -------------------------------------------------------------

    /// Snapshot of the cached flows, most recently created first.
    pub fn flows(&self) -> Vec<Flow> {
        self.flows.borrow().clone()
    }

    pub fn current_flow(&self) -> Option<Flow> {
        self.current_flow.borrow().clone()
    }

    pub fn total_flows(&self) -> usize {
        self.flows.borrow().len()
    }

    /// Cached flows that are not archived.
    pub fn active_flows(&self) -> Vec<Flow> {
        self.flows.borrow().iter().filter(|f| f.is_active()).cloned().collect()
    }

    pub fn loading(&self) -> bool {
        self.in_flight.is_loading()
    }

    pub fn watch_flows(&self) -> watch::Receiver<Vec<Flow>> {
        self.flows.subscribe()
    }

    pub fn watch_current_flow(&self) -> watch::Receiver<Option<Flow>> {
        self.current_flow.subscribe()
    }

    /// Outstanding request count; the store is loading while it is non-zero.
    pub fn watch_loading(&self) -> watch::Receiver<usize> {
        self.in_flight.subscribe()
    }

    pub async fn wait_idle(&self) {
        self.in_flight.wait_idle().await
    }

    // --- operations --------------------------------------------------------

    /// Replaces the whole cache with the server's listing.
    #[instrument(skip(self))]
    pub async fn list_flows(&self) -> ApiResult<Vec<Flow>> {
        let _loading = self.in_flight.begin();
        settle(Operation::ListFlows, self.try_list_flows().await)
    }

    async fn try_list_flows(&self) -> StoreResult<Vec<Flow>> {
        let response = self.client.get(routes::FLOWS, None).await?;
        let flows = envelope::flow_list(unwrap_data(response.data))?;

        debug!("Replacing flow cache with {} flows", flows.len());
        self.flows.send_replace(flows.clone());
        Ok(flows)
    }

    /// Fetches one flow and selects it as the current flow.
    #[instrument(skip(self), fields(flow_id = %id))]
    pub async fn get_flow(&self, id: &FlowId) -> ApiResult<Flow> {
        let _loading = self.in_flight.begin();
        settle(Operation::GetFlow, self.try_get_flow(id).await)
    }

    async fn try_get_flow(&self, id: &FlowId) -> StoreResult<Flow> {
        let response = self.client.get(&routes::flow(id), None).await?;
        let flow: Flow = envelope::decode(unwrap_data(response.data))?;

        self.current_flow.send_replace(Some(flow.clone()));
        Ok(flow)
    }

    /// Creates a flow and puts it at the front of the cache.
    ///
    /// Only name, description, category and visibility are sent; every other
    /// field of `input` is dropped.
    #[instrument(skip(self, input))]
    pub async fn create_flow(&self, input: &FlowInput) -> ApiResult<Flow> {
        let _loading = self.in_flight.begin();
        settle(Operation::CreateFlow, self.try_create_flow(input).await)
    }

    async fn try_create_flow(&self, input: &FlowInput) -> StoreResult<Flow> {
        let payload = serde_json::to_value(input.create_payload())?;
        let response = self.client.post(routes::FLOWS, Some(payload)).await?;
        let flow: Flow = envelope::decode(unwrap_data(response.data))?;

        debug!(flow_id = %flow.id, "Prepending created flow");
        self.flows.send_modify(|flows| flows.insert(0, flow.clone()));
        Ok(flow)
    }

    /// Updates a flow, patching the cached entry in place.
    ///
    /// The current flow is always overwritten with the response, whether or
    /// not it was the flow being updated.
    #[instrument(skip(self, input), fields(flow_id = %id))]
    pub async fn update_flow(&self, id: &FlowId, input: &FlowInput) -> ApiResult<Flow> {
        let _loading = self.in_flight.begin();
        settle(Operation::UpdateFlow, self.try_update_flow(id, input).await)
    }

    async fn try_update_flow(&self, id: &FlowId, input: &FlowInput) -> StoreResult<Flow> {
        let payload = serde_json::to_value(input.update_payload())?;
        let response = self.client.put(&routes::flow(id), payload).await?;
        let flow: Flow = envelope::decode(unwrap_data(response.data))?;

        self.flows.send_if_modified(|flows| match flows.iter_mut().find(|f| &f.id == id) {
            Some(cached) => {
                *cached = flow.clone();
                true
            }
            None => false,
        });

        let previous = self.current_flow.send_replace(Some(flow.clone()));
        if let Some(previous) = previous.filter(|p| &p.id != id) {
            // TODO: confirm with product whether an unrelated selection should be kept
            debug!(selected = %previous.id, "Update replaced a different selected flow");
        }
        Ok(flow)
    }

    /// Deletes a flow remotely, then drops it from the cache.
    #[instrument(skip(self), fields(flow_id = %id))]
    pub async fn delete_flow(&self, id: &FlowId) -> ApiResult<()> {
        let _loading = self.in_flight.begin();
        settle(Operation::DeleteFlow, self.try_delete_flow(id).await)
    }

    async fn try_delete_flow(&self, id: &FlowId) -> StoreResult<()> {
        self.client.delete(&routes::flow(id)).await?;

        self.flows.send_if_modified(|flows| {
            let before = flows.len();
            flows.retain(|f| &f.id != id);
            flows.len() != before
        });
        Ok(())
    }

    /// Duplicates a flow server-side and puts the copy at the front of the cache.
    #[instrument(skip(self), fields(flow_id = %id))]
    pub async fn clone_flow(&self, id: &FlowId) -> ApiResult<Flow> {
        let _loading = self.in_flight.begin();
        settle(Operation::CloneFlow, self.try_clone_flow(id).await)
    }

    async fn try_clone_flow(&self, id: &FlowId) -> StoreResult<Flow> {
        let response = self.client.post(&routes::flow_clone(id), None).await?;
        let flow: Flow = envelope::decode(unwrap_data(response.data))?;

        debug!(clone_id = %flow.id, "Prepending cloned flow");
        self.flows.send_modify(|flows| flows.insert(0, flow.clone()));
        Ok(flow)
    }

    #[instrument(skip(self), fields(flow_id = %id))]
    pub async fn get_flow_stats(&self, id: &FlowId) -> ApiResult<Value> {
        let _loading = self.in_flight.begin();
        settle(Operation::FlowStats, self.fetch(&routes::flow_stats(id)).await)
    }

    #[instrument(skip(self), fields(flow_id = %id))]
    pub async fn get_flow_inputs(&self, id: &FlowId) -> ApiResult<Value> {
        let _loading = self.in_flight.begin();
        settle(Operation::FlowInputs, self.fetch(&routes::flow_inputs(id)).await)
    }

    /// Triggers an execution. The execution cache is not touched; list
    /// executions to see it.
    #[instrument(skip(self, input_data), fields(flow_id = %id))]
    pub async fn execute_flow(&self, id: &FlowId, input_data: Map<String, Value>) -> ApiResult<Value> {
        let _loading = self.in_flight.begin();
        settle(Operation::ExecuteFlow, self.try_execute_flow(id, input_data).await)
    }

    async fn try_execute_flow(&self, id: &FlowId, input_data: Map<String, Value>) -> StoreResult<Value> {
        let payload = serde_json::to_value(ExecuteFlowPayload { input_data })?;
        let response = self.client.post(&routes::flow_execute(id), Some(payload)).await?;
        Ok(unwrap_data(response.data))
    }

    /// Public listing; the private flow cache is left alone.
    ///
    /// Pagination metadata, when the server sends any, is returned beside
    /// the data.
    #[instrument(skip(self))]
    pub async fn get_public_flows(&self) -> ApiResult<Vec<Flow>> {
        let _loading = self.in_flight.begin();
        match self.try_public_flows().await {
            Ok((flows, pagination)) => ApiResult::paginated(flows, pagination),
            Err(err) => settle(Operation::PublicFlows, Err(err)),
        }
    }

    async fn try_public_flows(&self) -> StoreResult<(Vec<Flow>, Option<Pagination>)> {
        let response = self.client.get(routes::PUBLIC_FLOWS, None).await?;
        let pagination = envelope::pagination_of(&response.data);
        let flows = envelope::flow_list(unwrap_data(response.data))?;
        Ok((flows, pagination))
    }

    async fn fetch(&self, path: &str) -> StoreResult<Value> {
        let response = self.client.get(path, None).await?;
        Ok(unwrap_data(response.data))
    }

    /// Drops every cached value.
    pub(crate) fn clear(&self) {
        self.flows.send_replace(Vec::new());
        self.current_flow.send_replace(None);
    }
}

impl std::fmt::Debug for FlowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowStore")
            .field("flows", &self.total_flows())
            .field("current_flow", &self.current_flow.borrow().as_ref().map(|f| f.id.clone()))
            .field("in_flight", &self.in_flight.count())
            .finish()
    }
}

/// Convenience for callers that have no inputs to pass to [`FlowStore::execute_flow`].
pub fn no_inputs() -> Map<String, Value> {
    Map::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockRemoteClient;
    use flowsync_interfaces::HttpMethod;
    use serde_json::json;

    fn store_with(client: &Arc<MockRemoteClient>) -> FlowStore {
        FlowStore::new(client.clone())
    }

    #[tokio::test]
    async fn test_derived_views_follow_cache() {
        let client = Arc::new(MockRemoteClient::new());
        client.respond_json(
            HttpMethod::Get,
            "/flows",
            json!({"data": {"flows": [
                {"id": "1", "name": "A"},
                {"_id": "2", "name": "B", "archived": true},
                {"id": "3", "name": "C", "archived": false}
            ]}}),
        );
        let store = store_with(&client);

        assert_eq!(store.total_flows(), 0);
        assert!(store.list_flows().await.is_success());

        assert_eq!(store.total_flows(), 3);
        let active: Vec<_> = store.active_flows().into_iter().map(|f| f.id.0).collect();
        assert_eq!(active, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_watch_flows_sees_create() {
        let client = Arc::new(MockRemoteClient::new());
        client.respond_json(HttpMethod::Post, "/flows", json!({"data": {"id": "n1", "name": "New"}}));
        let store = store_with(&client);
        let mut rx = store.watch_flows();

        store.create_flow(&FlowInput::named("New")).await;

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update()[0].id.as_str(), "n1");
    }

    #[tokio::test]
    async fn test_execute_flow_with_no_inputs_sends_empty_object() {
        let client = Arc::new(MockRemoteClient::new());
        client.respond_json(HttpMethod::Post, "/flows/f9/execute", json!({"executionId": "e1"}));
        let store = store_with(&client);

        let result = store.execute_flow(&FlowId::from("f9"), no_inputs()).await;

        assert_eq!(result.data(), Some(&json!({"executionId": "e1"})));
        assert_eq!(client.requests()[0].body, Some(json!({"inputData": {}})));
    }
}
