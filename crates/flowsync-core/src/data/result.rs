//! The discriminated result every store operation resolves to

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::data::types::Pagination;

/// Outcome of a store operation.
///
/// Failures carry a message meant to be rendered as-is; no error codes are
/// exposed. On the wire this is `{success: true, data, pagination?}` or
/// `{success: false, error}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult<T> {
    Success {
        data: T,
        pagination: Option<Pagination>,
    },
    Failure {
        error: String,
    },
}

impl<T> ApiResult<T> {
    pub fn success(data: T) -> Self {
        ApiResult::Success { data, pagination: None }
    }

    pub fn paginated(data: T, pagination: Option<Pagination>) -> Self {
        ApiResult::Success { data, pagination }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        ApiResult::Failure { error: error.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiResult::Success { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ApiResult::Success { data, .. } => Some(data),
            ApiResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ApiResult::Success { .. } => None,
            ApiResult::Failure { error } => Some(error),
        }
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        match self {
            ApiResult::Success { pagination, .. } => pagination.as_ref(),
            ApiResult::Failure { .. } => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ApiResult<U> {
        match self {
            ApiResult::Success { data, pagination } => ApiResult::Success { data: f(data), pagination },
            ApiResult::Failure { error } => ApiResult::Failure { error },
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            ApiResult::Success { data, .. } => Ok(data),
            ApiResult::Failure { error } => Err(error),
        }
    }
}

impl<T: Serialize> Serialize for ApiResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ApiResult::Success { data, pagination } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("data", data)?;
                if let Some(pagination) = pagination {
                    map.serialize_entry("pagination", pagination)?;
                }
                map.end()
            }
            ApiResult::Failure { error } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}
