//! FlowSync Interfaces
//!
//! This crate provides the transport contract between the FlowSync resource
//! stores and whatever HTTP stack the host application wires in.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Remote transport interfaces
pub mod remote;

/// Re-export key types for convenient usage
pub use remote::{
    HttpMethod, QueryParams, RemoteClient, RemoteResponse, TransportError, TransportResult,
};
