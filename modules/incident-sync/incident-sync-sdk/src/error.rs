//! Incident sync error types.
//!
//! Transport-agnostic error definitions shared by the gateway and its adapters.

use thiserror::Error;
use uuid::Uuid;

/// Error type for incident sync operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IncidentSyncError {
    /// Ticketing credentials could not be read or parsed.
    #[error("credentials unavailable: {message}")]
    CredentialUnavailable { message: String },

    /// The ticketing service could not be reached.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The ticketing service answered with a non-2xx status.
    #[error("upstream returned status {status_code}: {body}")]
    UpstreamRejected { status_code: u16, body: String },

    /// Writing an incident to the local mirror failed.
    #[error("mirror write failed for incident {incident_id}: {message}")]
    MirrorWriteFailed {
        incident_id: String,
        message: String,
    },

    /// Writing a call-log record failed.
    #[error("telemetry write failed for request {request_id}: {message}")]
    TelemetryWriteFailed { request_id: Uuid, message: String },

    /// Internal error.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl IncidentSyncError {
    /// Create a credentials unavailable error.
    #[must_use]
    pub fn credential_unavailable(message: impl Into<String>) -> Self {
        Self::CredentialUnavailable {
            message: message.into(),
        }
    }

    /// Create a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create an upstream rejected error.
    #[must_use]
    pub fn upstream_rejected(status_code: u16, body: impl Into<String>) -> Self {
        Self::UpstreamRejected {
            status_code,
            body: body.into(),
        }
    }

    /// Create a mirror write failure.
    #[must_use]
    pub fn mirror_write_failed(incident_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MirrorWriteFailed {
            incident_id: incident_id.into(),
            message: message.into(),
        }
    }

    /// Create a telemetry write failure.
    #[must_use]
    pub fn telemetry_write_failed(request_id: Uuid, message: impl Into<String>) -> Self {
        Self::TelemetryWriteFailed {
            request_id,
            message: message.into(),
        }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
