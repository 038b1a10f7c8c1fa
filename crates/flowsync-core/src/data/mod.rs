//! Core data structures for FlowSync

pub mod entities;
pub mod errors;
pub mod identifiers;
pub mod result;
pub mod types;

// Re-export all common types
pub use entities::{CreateFlowPayload, Execution, ExecuteFlowPayload, Flow, FlowInput, UpdateFlowPayload};
pub use errors::{ConfigError, StoreError, StoreResult};
pub use identifiers::{ExecutionId, FlowId};
pub use result::ApiResult;
pub use types::{ExecutionQuery, Operation, Pagination};
