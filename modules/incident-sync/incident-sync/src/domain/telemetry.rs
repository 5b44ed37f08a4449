//! Per-call telemetry: one call-log record per upstream call attempt.

use std::sync::Arc;

use chrono::Utc;
use incident_sync_sdk::{CallLogRecord, HttpMethod, IncidentSyncError};
use tracing::{debug, error};
use uuid::Uuid;

use super::repo::CallLogStore;

/// Status recorded when no HTTP status was obtained from upstream.
pub const SYNTHESIZED_FAILURE_STATUS: u16 = 500;

/// Outcome of one upstream call attempt.
#[derive(Debug, Clone)]
pub struct CallAttempt<'a> {
    pub request_id: Uuid,
    pub endpoint: &'a str,
    pub method: HttpMethod,
    pub status_code: u16,
    pub latency_ms: u64,
    pub error: Option<String>,
}

/// Writes call-log records. Persistence failures never reach the caller.
pub struct CallTelemetry {
    store: Arc<dyn CallLogStore>,
    environment: String,
    project_name: String,
}

impl CallTelemetry {
    pub fn new(
        store: Arc<dyn CallLogStore>,
        environment: impl Into<String>,
        project_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            environment: environment.into(),
            project_name: project_name.into(),
        }
    }

    /// Record an attempt; a failed write is logged and dropped.
    pub async fn record(&self, attempt: CallAttempt<'_>) {
        if let Err(e) = self.try_record(attempt).await {
            error!(error = %e, "Failed to log upstream call");
        }
    }

    /// Record an attempt and report the write outcome.
    ///
    /// # Errors
    /// Returns [`IncidentSyncError::TelemetryWriteFailed`] if the store rejects the record.
    pub async fn try_record(&self, attempt: CallAttempt<'_>) -> Result<(), IncidentSyncError> {
        let record = CallLogRecord {
            request_id: attempt.request_id,
            timestamp: Utc::now(),
            endpoint: attempt.endpoint.to_owned(),
            method: attempt.method,
            status_code: attempt.status_code,
            response_time_ms: attempt.latency_ms,
            environment: self.environment.clone(),
            project_name: self.project_name.clone(),
            error: attempt.error,
        };

        self.store.insert(record).await.map_err(|e| {
            IncidentSyncError::telemetry_write_failed(attempt.request_id, e.to_string())
        })?;

        debug!(
            request_id = %attempt.request_id,
            endpoint = attempt.endpoint,
            status_code = attempt.status_code,
            "Upstream call logged"
        );
        Ok(())
    }
}
