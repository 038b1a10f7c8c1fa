//! Entity definitions mirrored from the remote flow service
//!
//! Records are decoded through lenient raw shapes (`FlowRecord`,
//! `ExecutionRecord`) so that identity, nullable collections and timestamps
//! are normalized exactly once, at the boundary.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::data::identifiers::{canonical_identity, ExecutionId, FlowId};

/// A server-stored workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "FlowRecord")]
pub struct Flow {
    pub id: FlowId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub archived: bool,
    /// Opaque graph payload (nodes/edges), passed through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Server fields this crate does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Flow {
    /// Creates a minimal flow, mostly useful for fixtures.
    pub fn new(id: impl Into<FlowId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: String::new(),
            is_public: false,
            tags: Vec::new(),
            archived: false,
            flow_data: None,
            created_at: None,
            extra: Map::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.archived
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlowRecord {
    id: Option<Value>,
    #[serde(rename = "_id")]
    legacy_id: Option<Value>,
    name: Option<Value>,
    description: Option<Value>,
    category: Option<Value>,
    is_public: Option<Value>,
    tags: Option<Value>,
    archived: Option<Value>,
    flow_data: Option<Value>,
    created_at: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<FlowRecord> for Flow {
    type Error = String;

    fn try_from(record: FlowRecord) -> Result<Self, Self::Error> {
        let id = canonical_identity(record.id.as_ref(), record.legacy_id.as_ref())
            .ok_or_else(|| "flow record carries neither `id` nor `_id`".to_string())?;

        let mut extra = record.extra;
        let created_at = take_timestamp(record.created_at, &mut extra);

        Ok(Flow {
            id: FlowId(id),
            name: text(record.name).unwrap_or_default(),
            description: text(record.description).unwrap_or_default(),
            category: text(record.category).unwrap_or_default(),
            is_public: record.is_public.as_ref().map(is_truthy).unwrap_or(false),
            tags: string_list(record.tags),
            archived: record.archived.as_ref().map(is_truthy).unwrap_or(false),
            flow_data: record.flow_data.filter(|v| !v.is_null()),
            created_at,
            extra,
        })
    }
}

/// One run instance of a Flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ExecutionRecord")]
pub struct Execution {
    pub id: ExecutionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<FlowId>,
    /// Server-defined lifecycle status (e.g. "running", "completed")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub input_data: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Execution {
    pub fn new(id: impl Into<ExecutionId>, created_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: id.into(),
            flow_id: None,
            status: None,
            input_data: Map::new(),
            created_at,
            extra: Map::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionRecord {
    id: Option<Value>,
    #[serde(rename = "_id")]
    legacy_id: Option<Value>,
    flow_id: Option<Value>,
    status: Option<Value>,
    input_data: Option<Value>,
    created_at: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<ExecutionRecord> for Execution {
    type Error = String;

    fn try_from(record: ExecutionRecord) -> Result<Self, Self::Error> {
        let id = canonical_identity(record.id.as_ref(), record.legacy_id.as_ref())
            .ok_or_else(|| "execution record carries neither `id` nor `_id`".to_string())?;

        // The owning flow is sometimes populated as a full object.
        let flow_id = match record.flow_id {
            Some(Value::Object(flow)) => canonical_identity(flow.get("id"), flow.get("_id")),
            Some(other) => canonical_identity(Some(&other), None),
            None => None,
        };

        let mut extra = record.extra;
        let created_at = take_timestamp(record.created_at, &mut extra);

        Ok(Execution {
            id: ExecutionId(id),
            flow_id: flow_id.map(FlowId),
            status: text(record.status),
            input_data: match record.input_data {
                Some(Value::Object(map)) => map,
                _ => Map::new(),
            },
            created_at,
            extra,
        })
    }
}

/// Caller-supplied flow fields for create and update.
///
/// Only a subset of these is ever forwarded; see [`FlowInput::create_payload`]
/// and [`FlowInput::update_payload`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_data: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FlowInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = Some(is_public);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn flow_data(mut self, flow_data: Value) -> Self {
        self.flow_data = Some(flow_data);
        self
    }

    /// Attaches a field this crate does not model.
    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Body for `POST /flows`: name, description, category and visibility only.
    pub fn create_payload(&self) -> CreateFlowPayload<'_> {
        CreateFlowPayload {
            name: self.name.as_deref(),
            description: self.description.as_deref().unwrap_or_default(),
            category: self.category.as_deref().unwrap_or_default(),
            is_public: self.is_public.unwrap_or(false),
        }
    }

    /// Body for `PUT /flows/{id}`. `flowData` is only sent when supplied.
    pub fn update_payload(&self) -> UpdateFlowPayload<'_> {
        UpdateFlowPayload {
            name: self.name.as_deref(),
            description: self.description.as_deref().unwrap_or_default(),
            is_public: self.is_public.unwrap_or(false),
            tags: self.tags.as_deref().unwrap_or_default(),
            category: self.category.as_deref().unwrap_or_default(),
            flow_data: self.flow_data.as_ref().filter(|v| !v.is_null()),
        }
    }
}

/// Request body for flow creation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlowPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    pub description: &'a str,
    pub category: &'a str,
    pub is_public: bool,
}

/// Request body for flow updates
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFlowPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    pub description: &'a str,
    pub is_public: bool,
    pub tags: &'a [String],
    pub category: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_data: Option<&'a Value>,
}

/// Request body for `POST /flows/{id}/execute`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteFlowPayload {
    pub input_data: Map<String, Value>,
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Scalar text fields; anything that is not a scalar is dropped.
fn text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Keeps the string entries of a tag list.
fn string_list(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Parses `createdAt`; an unreadable value goes back into `extra` untouched.
fn take_timestamp(value: Option<Value>, extra: &mut Map<String, Value>) -> Option<DateTime<Utc>> {
    let value = value.filter(|v| !v.is_null())?;
    match parse_timestamp(&value) {
        Some(timestamp) => Some(timestamp),
        None => {
            extra.insert("createdAt".to_string(), value);
            None
        }
    }
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Accepts RFC 3339 strings, offset-less ISO datetimes (read as UTC), bare
/// dates and epoch milliseconds.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            NAIVE_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|date| date.and_hms_opt(0, 0, 0))
                })
                .map(|naive| Utc.from_utc_datetime(&naive))
        }
        Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}
