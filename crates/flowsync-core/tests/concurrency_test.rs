//! Overlapping operations against one store, with response order fixed by gates


use std::sync::Arc;

use futures::FutureExt;
use pretty_assertions::assert_eq;
use serde_json::json;

use flowsync_core::{
    ExecutionId, ExecutionQuery, FlowId, FlowInput, FlowStore, FlowSync, HttpMethod, TransportError,
};
use flowsync_core::test_utils::MockRemoteClient;
use test_helpers::{cached_ids, flow_json, flow_store, seed_flows};

async fn wait_for_in_flight(store: &FlowStore, count: usize) {
    let mut rx = store.watch_loading();
    rx.wait_for(|n| *n == count).await.expect("store dropped");
}

#[test_log::test(tokio::test)]
async fn test_loading_holds_until_last_request_settles() {
    let (store, client) = flow_store();
    let store = Arc::new(store);
    let first = client.gate(HttpMethod::Get, "/flows");
    let second = client.gate(HttpMethod::Get, "/flows");

    let a = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.list_flows().await }
    });
    let b = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.list_flows().await }
    });
    wait_for_in_flight(&store, 2).await;
    assert!(store.loading());

    first.release_json(json!({"data": {"flows": [flow_json("1", "A")]}}));
    wait_for_in_flight(&store, 1).await;
    assert!(store.loading(), "one request is still outstanding");
    assert_eq!(cached_ids(&store), vec!["1"]);

    second.release_json(json!({"data": {"flows": [flow_json("2", "B")]}}));
    assert!(a.await.unwrap().is_success());
    assert!(b.await.unwrap().is_success());

    assert!(!store.loading());
    assert_eq!(cached_ids(&store), vec!["2"], "last response to arrive wins");
}

#[tokio::test]
async fn test_failed_request_does_not_clear_loading_of_another() {
    let (store, client) = flow_store();
    let store = Arc::new(store);
    let stats = client.gate(HttpMethod::Get, "/flows/1/stats");
    let listing = client.gate(HttpMethod::Get, "/flows");

    let stats_task = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.get_flow_stats(&FlowId::from("1")).await }
    });
    let list_task = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.list_flows().await }
    });
    wait_for_in_flight(&store, 2).await;

    stats.release_error(TransportError::Connection("reset by peer".to_string()));
    let stats_result = stats_task.await.unwrap();
    assert_eq!(stats_result.error(), Some("Connection error: reset by peer"));
    assert!(store.loading());

    listing.release_json(json!({"data": []}));
    assert!(list_task.await.unwrap().is_success());
    assert!(!store.loading());
}

#[tokio::test]
async fn test_create_resolving_after_list_is_kept() {
    let (store, client) = flow_store();
    let store = Arc::new(store);
    let listing = client.gate(HttpMethod::Get, "/flows");
    let created = client.gate(HttpMethod::Post, "/flows");

    let list_task = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.list_flows().await }
    });
    let create_task = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.create_flow(&FlowInput::named("New")).await }
    });
    wait_for_in_flight(&store, 2).await;

    listing.release_json(json!({"data": {"flows": [flow_json("1", "A")]}}));
    list_task.await.unwrap();
    created.release_json(json!({"data": flow_json("n", "New")}));
    create_task.await.unwrap();

    assert_eq!(cached_ids(&store), vec!["n", "1"]);
}

#[tokio::test]
async fn test_list_resolving_after_create_overwrites_it() {
    let (store, client) = flow_store();
    let store = Arc::new(store);
    let listing = client.gate(HttpMethod::Get, "/flows");
    let created = client.gate(HttpMethod::Post, "/flows");

    let list_task = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.list_flows().await }
    });
    let create_task = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.create_flow(&FlowInput::named("New")).await }
    });
    wait_for_in_flight(&store, 2).await;

    created.release_json(json!({"data": flow_json("n", "New")}));
    assert!(create_task.await.unwrap().is_success());
    assert_eq!(cached_ids(&store), vec!["n"]);

    listing.release_json(json!({"data": {"flows": [flow_json("1", "A")]}}));
    list_task.await.unwrap();

    // The stale listing replaces the cache wholesale.
    assert_eq!(cached_ids(&store), vec!["1"]);
}

#[tokio::test]
async fn test_update_after_delete_does_not_resurrect_flow() {
    let (store, client) = flow_store();
    seed_flows(&store, &client, vec![flow_json("1", "A")]).await;
    let store = Arc::new(store);
    let update = client.gate(HttpMethod::Put, "/flows/1");
    client.respond_json(HttpMethod::Delete, "/flows/1", json!({"success": true}));

    let update_task = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.update_flow(&FlowId::from("1"), &FlowInput::named("A2")).await }
    });
    wait_for_in_flight(&store, 1).await;

    assert!(store.delete_flow(&FlowId::from("1")).await.is_success());
    update.release_json(json!({"data": flow_json("1", "A2")}));
    assert!(update_task.await.unwrap().is_success());

    assert_eq!(store.total_flows(), 0);
    assert_eq!(store.current_flow().map(|f| f.name), Some("A2".to_string()));
}

#[tokio::test]
async fn test_dropped_operation_releases_loading() {
    let (store, client) = flow_store();
    let _gate = client.gate(HttpMethod::Get, "/flows/1");

    let pending = store.get_flow(&FlowId::from("1")).now_or_never();

    assert!(pending.is_none());
    assert!(!store.loading());
    assert_eq!(client.request_count(), 1);
    assert!(store.current_flow().is_none());
}

#[tokio::test]
async fn test_stores_track_loading_independently() {
    let client = Arc::new(MockRemoteClient::new());
    let sync = FlowSync::new(client.clone());
    let execute = client.gate(HttpMethod::Post, "/flows/f1/execute");
    client.respond_json(HttpMethod::Get, "/executions", json!({"data": [{"id": "e0"}]}));

    let flows = Arc::clone(sync.flows());
    let execute_task = tokio::spawn(async move {
        flows.execute_flow(&FlowId::from("f1"), flowsync_core::no_inputs()).await
    });
    wait_for_in_flight(sync.flows(), 1).await;

    assert!(sync.loading());
    assert!(!sync.executions().loading());
    sync.executions().list_executions(&ExecutionQuery::new()).await;

    execute.release_json(json!({"data": {"executionId": "e1"}}));
    assert!(execute_task.await.unwrap().is_success());

    // Triggering an execution never inserts into the execution cache.
    let ids: Vec<ExecutionId> = sync.executions().executions().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![ExecutionId::from("e0")]);
    assert!(!sync.loading());
}

#[tokio::test]
async fn test_shutdown_waits_for_outstanding_requests() {
    let client = Arc::new(MockRemoteClient::new());
    let sync = FlowSync::new(client.clone());
    let gate = client.gate(HttpMethod::Get, "/flows/1");

    let flows = Arc::clone(sync.flows());
    let task = tokio::spawn({
        let flows = Arc::clone(&flows);
        async move { flows.get_flow(&FlowId::from("1")).await }
    });
    wait_for_in_flight(&flows, 1).await;

    let shutdown = tokio::spawn(sync.shutdown());
    tokio::task::yield_now().await;
    assert!(!shutdown.is_finished());

    gate.release_json(json!({"id": "1", "name": "A"}));
    assert!(task.await.unwrap().is_success());
    shutdown.await.unwrap();

    assert!(flows.current_flow().is_none());
}
