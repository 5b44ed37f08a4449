//! Incident Sync SDK
//!
//! This crate provides the public contract of the incident sync gateway:
//! the models exchanged with the ticketing service and the local store,
//! the uniform response envelope, and the error taxonomy.
//!
//! ## API Traits
//!
//! - `IncidentSyncApi` - per-invocation entry point exposed by the gateway
//!
//! ## Usage
//!
//! ```ignore
//! use incident_sync_sdk::{IncidentSyncApi, InboundRequest};
//!
//! let envelope = gateway.handle(InboundRequest::new(http::Method::GET)).await;
//! assert!(envelope.success);
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod envelope;
pub mod error;
pub mod models;

// API traits
pub use api::IncidentSyncApi;

// Envelope
pub use envelope::Envelope;

// Error types
pub use error::IncidentSyncError;

// Models
pub use models::{
    CallLogRecord, Credentials, HttpMethod, InboundRequest, MirroredIncident, UpstreamRequest,
    UpstreamResponse,
};
