//! Test doubles for the transport seam

pub mod mocks;

// Re-export commonly used test utilities
pub use mocks::{MockRemoteClient, RecordedRequest, ResponseGate};
