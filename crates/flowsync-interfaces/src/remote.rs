//! Remote transport interfaces for FlowSync
//!
//! The stores never speak HTTP themselves. They go through [`RemoteClient`],
//! which the host application implements (or takes from the `http` adapter in
//! `flowsync-core`). Base URL resolution, auth headers, retries and timeouts
//! all live on the far side of this trait.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Query parameters forwarded verbatim to the transport, ordered by key
pub type QueryParams = BTreeMap<String, String>;

/// HTTP verb used by a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        };
        f.write_str(verb)
    }
}

/// A successful response from the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteResponse {
    /// HTTP status code
    pub status: u16,

    /// Decoded response body, `Value::Null` when the body was empty
    pub data: Value,
}

impl RemoteResponse {
    /// Creates a 200 response carrying `data`
    pub fn ok(data: Value) -> Self {
        Self { status: 200, data }
    }

    /// Consumes the response, returning the body
    pub fn into_data(self) -> Value {
        self.data
    }
}

/// Errors that can occur when talking to the remote service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The request did not complete in time
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// The remote service could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// The service answered with a non-success status
    #[error("{message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Transport-level description of the failure
        message: String,
        /// Response body, `Value::Null` when absent or not JSON
        body: Value,
    },

    /// The response body could not be decoded
    #[error("Invalid response body: {0}")]
    InvalidBody(String),

    /// Any other transport failure
    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Builds a status error with the conventional transport message
    pub fn status(status: u16, body: Value) -> Self {
        TransportError::Status {
            status,
            message: format!("Request failed with status code {}", status),
            body,
        }
    }

    /// HTTP status, when the service answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body sent by the service, if any
    pub fn response_body(&self) -> Option<&Value> {
        match self {
            TransportError::Status { body, .. } if !body.is_null() => Some(body),
            _ => None,
        }
    }

    /// The transport-level message, without any server-provided detail
    pub fn transport_message(&self) -> String {
        self.to_string()
    }
}

/// Contract for the HTTP collaborator the stores issue requests through
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Contract: Issues a GET for `path` relative to the configured base.
    /// - `params`: Optional query parameters, forwarded verbatim.
    /// - Returns: the decoded response, or `Err` on transport or status failure.
    async fn get(&self, path: &str, params: Option<&QueryParams>) -> TransportResult<RemoteResponse>;

    /// Contract: Issues a POST for `path` with an optional JSON body.
    async fn post(&self, path: &str, body: Option<Value>) -> TransportResult<RemoteResponse>;

    /// Contract: Issues a PUT for `path` with a JSON body.
    async fn put(&self, path: &str, body: Value) -> TransportResult<RemoteResponse>;

    /// Contract: Issues a DELETE for `path`.
    async fn delete(&self, path: &str) -> TransportResult<RemoteResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_status_error_exposes_body_and_message() {
        let err = TransportError::status(404, json!({"message": "not found"}));

        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.response_body(), Some(&json!({"message": "not found"})));
        assert_eq!(err.transport_message(), "Request failed with status code 404");
    }

    #[test]
    fn test_null_body_is_not_reported() {
        let err = TransportError::status(500, Value::Null);
        assert!(err.response_body().is_none());

        let err = TransportError::Timeout("30s elapsed".to_string());
        assert!(err.response_body().is_none());
        assert_eq!(err.status_code(), None);
        assert_eq!(err.transport_message(), "Request timeout: 30s elapsed");
    }

    #[test]
    fn test_method_display() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }
}
