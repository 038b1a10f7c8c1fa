//! Error types for FlowSync

use flowsync_interfaces::TransportError;
use thiserror::Error;

/// Internal failure of a store operation.
///
/// Never returned from a public store method; it is resolved into an
/// [`ApiResult::Failure`](crate::ApiResult) message at the operation boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Serialization/Deserialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for internal store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[cfg(feature = "http")]
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
