//! Response envelope normalization and failure message resolution
//!
//! Endpoints are inconsistent about nesting their payload under `data`. All
//! responses go through [`unwrap_data`] before anything else looks at them,
//! and all failures go through [`failure_message`].

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::data::{ApiResult, Flow, Operation, Pagination, StoreError, StoreResult};

/// Returns the nested `data` field when present and non-null, else the body itself.
pub fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) if !data.is_null() => data,
            Some(data) => {
                map.insert("data".to_string(), data);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}

/// Reads top-level pagination metadata from a listing body.
pub fn pagination_of(body: &Value) -> Option<Pagination> {
    let raw = body.get("pagination").filter(|p| !p.is_null())?;
    match serde_json::from_value(raw.clone()) {
        Ok(pagination) => Some(pagination),
        Err(e) => {
            debug!("Ignoring unreadable pagination block: {}", e);
            None
        }
    }
}

/// Decodes an already unwrapped payload into `T`.
pub fn decode<T: DeserializeOwned>(payload: Value) -> StoreResult<T> {
    serde_json::from_value(payload).map_err(|e| StoreError::MalformedResponse(e.to_string()))
}

/// Decodes the records of a listing, skipping the ones that cannot be read.
pub fn decode_records<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    let total = items.len();
    let records: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping unreadable record: {}", e);
                None
            }
        })
        .collect();

    if records.len() < total {
        debug!("Kept {} of {} listed records", records.len(), total);
    }
    records
}

/// Extracts a flow listing from an unwrapped payload.
///
/// Accepts `{flows: [...]}` as well as a bare array.
pub fn flow_list(payload: Value) -> StoreResult<Vec<Flow>> {
    match payload {
        Value::Array(items) => Ok(decode_records(items)),
        Value::Object(mut map) => match map.remove("flows") {
            Some(Value::Array(items)) => Ok(decode_records(items)),
            _ => Err(StoreError::MalformedResponse(
                "listing payload has no `flows` array".to_string(),
            )),
        },
        other => Err(StoreError::MalformedResponse(format!(
            "unexpected listing payload: {}",
            other
        ))),
    }
}

/// Resolves the user-facing message for a failed operation.
///
/// Precedence: body `error.message`, body `message`, the transport's own
/// message, then the operation's fallback text.
pub fn failure_message(err: &StoreError, operation: Operation) -> String {
    match err {
        StoreError::Transport(transport) => transport
            .response_body()
            .and_then(body_message)
            .or_else(|| Some(transport.transport_message()).filter(|m| !m.is_empty()))
            .unwrap_or_else(|| operation.fallback_message().to_string()),
        StoreError::MalformedResponse(_) | StoreError::SerializationError(_) => {
            operation.fallback_message().to_string()
        }
    }
}

fn body_message(body: &Value) -> Option<String> {
    let non_empty = |v: &Value| v.as_str().filter(|s| !s.is_empty()).map(str::to_string);

    body.pointer("/error/message")
        .and_then(non_empty)
        .or_else(|| body.get("message").and_then(non_empty))
}

/// Converts an internal outcome into the public result, logging failures.
pub(crate) fn settle<T>(operation: Operation, result: StoreResult<T>) -> ApiResult<T> {
    match result {
        Ok(data) => ApiResult::success(data),
        Err(err) => {
            let message = failure_message(&err, operation);
            warn!(operation = %operation, error = %err, "{}", message);
            ApiResult::failure(message)
        }
    }
}
