//! FlowSync core
//!
//! Mirrors a remote flow service into local reactive state. [`FlowStore`]
//! caches flows and the selected flow, [`ExecutionStore`] caches the last
//! listed page of executions, and every operation resolves to an
//! [`ApiResult`]. Both stores talk to the server through the
//! [`RemoteClient`] seam from `flowsync-interfaces`.

// Core modules
pub mod config;
pub mod data;
pub mod services;

// Implementation adapters (optional, can be provided externally)
#[cfg(feature = "http")]
pub mod adapters;

// Testing utilities
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::sync::Arc;

use tracing::{info, warn};

// Re-export key types for convenient usage
pub use config::FlowSyncConfig;
pub use data::{
    ApiResult, ConfigError, Execution, ExecutionId, ExecutionQuery, Flow, FlowId, FlowInput,
    Operation, Pagination, StoreError,
};
pub use flowsync_interfaces::{
    HttpMethod, QueryParams, RemoteClient, RemoteResponse, TransportError, TransportResult,
};
pub use services::{no_inputs, ExecutionStore, FlowStore, RECENT_EXECUTIONS_LIMIT};

/// Initialize tracing, honouring `RUST_LOG`
pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Initialize tracing, falling back to `default_level` when `RUST_LOG` is unset
pub fn init_tracing_with_level(default_level: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed by the host application.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .try_init();
}

/// Application-wide handle on both stores.
///
/// Construct one at start-up, hand out [`FlowSync::flows`] and
/// [`FlowSync::executions`] to whoever needs them, and call
/// [`FlowSync::shutdown`] when the application stops.
#[derive(Debug, Clone)]
pub struct FlowSync {
    flows: Arc<FlowStore>,
    executions: Arc<ExecutionStore>,
}

impl FlowSync {
    /// Creates both stores over a shared transport.
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        info!("Creating FlowSync stores");
        Self {
            flows: Arc::new(FlowStore::new(Arc::clone(&client))),
            executions: Arc::new(ExecutionStore::new(client)),
        }
    }

    /// Creates both stores over the HTTP transport described by `config`.
    #[cfg(feature = "http")]
    pub fn from_config(config: &FlowSyncConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = adapters::create_http_client(config)?;
        Ok(Self::new(client))
    }

    /// The flow store; clone the `Arc` to hand it to another task.
    pub fn flows(&self) -> &Arc<FlowStore> {
        &self.flows
    }

    /// The execution store, sharing the flow store's transport.
    pub fn executions(&self) -> &Arc<ExecutionStore> {
        &self.executions
    }

    /// True while either store has a request outstanding.
    pub fn loading(&self) -> bool {
        self.flows.loading() || self.executions.loading()
    }

    /// Waits for outstanding requests, then drops every cached value.
    pub async fn shutdown(self) {
        if self.loading() {
            warn!("Shutting down with requests in flight; waiting for them to settle");
        }
        futures::join!(self.flows.wait_idle(), self.executions.wait_idle());

        self.flows.clear();
        self.executions.clear();
        info!("FlowSync stores shut down");
    }
}
