//! Incident Sync Gateway
//!
//! Exposes incident records of a table-style ITSM API ("the ticketing
//! service") over REST, mirrors every successfully observed incident into a
//! local store, and records one call-log entry per upstream call.
//!
//! ## Architecture
//!
//! ```text
//!        HTTP request
//!             │
//!             ▼
//! ┌──────────────────────────────┐
//! │  REST API (/incidents[/id])  │  CORS headers on every response
//! └──────────────────────────────┘
//!             │
//!             ▼
//! ┌──────────────────────────────┐
//! │  Request Router              │──► Credential Provider ──► SecretStore
//! └──────────────────────────────┘
//!             │
//!             ▼
//! ┌──────────────────────────────┐
//! │  Incident Operations         │──► Upstream Transport ──► ticketing API
//! └──────────────────────────────┘
//!        │              │
//!        ▼              ▼
//!   Call Telemetry   Incident Mirror
//!   (CallLogStore)   (IncidentStore)
//! ```
//!
//! The public API is defined in `incident-sync-sdk` and re-exported here.

// === PUBLIC API (from SDK) ===
pub use incident_sync_sdk::{
    CallLogRecord, Credentials, Envelope, HttpMethod, InboundRequest, IncidentSyncApi,
    IncidentSyncError, MirroredIncident, UpstreamRequest, UpstreamResponse,
};

// === WIRING ===
pub mod gateway;
pub use gateway::build_gateway;

// === INTERNAL MODULES ===
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
