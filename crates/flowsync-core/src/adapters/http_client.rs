use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, instrument};

use flowsync_interfaces::{QueryParams, RemoteClient, RemoteResponse, TransportError, TransportResult};

use crate::config::FlowSyncConfig;
use crate::data::ConfigError;

/// Configuration for the HTTP transport
#[derive(Debug, Clone)]
pub struct HttpRemoteClientConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,
    /// Timeout in seconds for HTTP requests
    pub timeout_secs: u64,
    /// Bearer token sent with every request, if any
    pub auth_token: Option<String>,
}

impl Default for HttpRemoteClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001/api".to_string(),
            timeout_secs: 30,
            auth_token: None,
        }
    }
}

impl From<&FlowSyncConfig> for HttpRemoteClientConfig {
    fn from(config: &FlowSyncConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            timeout_secs: config.timeout_secs,
            auth_token: config.auth_token.clone(),
        }
    }
}

/// [`RemoteClient`] over reqwest
#[derive(Debug, Clone)]
pub struct HttpRemoteClient {
    config: HttpRemoteClientConfig,
    client: Client,
}

impl HttpRemoteClient {
    /// Creates a new HttpRemoteClient with the provided configuration
    pub fn new(config: HttpRemoteClientConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Creates a new HttpRemoteClient with the provided base URL and timeout
    pub fn with_url_and_timeout(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, ConfigError> {
        Self::new(HttpRemoteClientConfig {
            base_url: base_url.into(),
            timeout_secs,
            auth_token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Maps an HTTP error to a TransportError
    fn map_http_error(error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(error.to_string())
        } else if error.is_connect() {
            TransportError::Connection(error.to_string())
        } else {
            TransportError::Other(error.to_string())
        }
    }

    async fn send(&self, request: RequestBuilder) -> TransportResult<RemoteResponse> {
        let request = match &self.config.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(Self::map_http_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(Self::map_http_error)?;

        if status.is_success() {
            let data = if bytes.is_empty() {
                Value::Null
            } else {
                // Plain-text replies are handed over as a JSON string.
                match serde_json::from_slice(&bytes) {
                    Ok(data) => data,
                    Err(_) => std::str::from_utf8(&bytes)
                        .map(|text| Value::String(text.to_string()))
                        .map_err(|e| TransportError::InvalidBody(format!("Failed to parse response: {}", e)))?,
                }
            };
            return Ok(RemoteResponse { status: status.as_u16(), data });
        }

        // Error bodies are best effort: JSON when possible, raw text otherwise.
        let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            let text = String::from_utf8_lossy(&bytes).trim().to_string();
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text)
            }
        });
        debug!(status = status.as_u16(), "Request failed");
        Err(TransportError::status(status.as_u16(), body))
    }
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    #[instrument(skip(self, params))]
    async fn get(&self, path: &str, params: Option<&QueryParams>) -> TransportResult<RemoteResponse> {
        let mut request = self.client.get(self.url(path));
        if let Some(params) = params {
            request = request.query(params);
        }
        self.send(request).await
    }

    #[instrument(skip(self, body))]
    async fn post(&self, path: &str, body: Option<Value>) -> TransportResult<RemoteResponse> {
        let mut request = self.client.post(self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        self.send(request).await
    }

    #[instrument(skip(self, body))]
    async fn put(&self, path: &str, body: Value) -> TransportResult<RemoteResponse> {
        self.send(self.client.put(self.url(path)).json(&body)).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, path: &str) -> TransportResult<RemoteResponse> {
        self.send(self.client.delete(self.url(path))).await
    }
}

/// Builds a shareable HTTP transport from the application configuration.
pub fn create_http_client(config: &FlowSyncConfig) -> Result<Arc<dyn RemoteClient>, ConfigError> {
    let client = HttpRemoteClient::new(HttpRemoteClientConfig::from(config))?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = HttpRemoteClient::with_url_and_timeout("http://api.local/v1/", 5).unwrap();
        assert_eq!(client.url("/flows/1"), "http://api.local/v1/flows/1");
        assert_eq!(client.base_url(), "http://api.local/v1/");
    }
}
