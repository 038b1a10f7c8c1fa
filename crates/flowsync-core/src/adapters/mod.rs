//! Adapter implementations for external services

pub mod http_client;

// Re-export adapters for easier import
pub use http_client::{create_http_client, HttpRemoteClient, HttpRemoteClientConfig};
