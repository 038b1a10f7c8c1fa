//! Resource stores and the plumbing they share

pub mod envelope;
pub mod executions;
pub mod flows;
pub mod loading;
pub mod routes;

// Re-exports
pub use executions::{ExecutionStore, RECENT_EXECUTIONS_LIMIT};
pub use flows::{no_inputs, FlowStore};
pub use loading::{InFlight, LoadingGuard};
