//! Local mirror of upstream incidents.

use std::sync::Arc;

use incident_sync_sdk::{IncidentSyncError, MirroredIncident};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::repo::IncidentStore;

/// Placeholder id used in errors for incidents without a `sys_id`.
const UNKNOWN_INCIDENT_ID: &str = "<missing sys_id>";

/// Project an upstream field to its mirrored string form.
///
/// Reference fields arrive as `{"link": .., "value": ..}` and are reduced to
/// their `value`.
fn field(incident: &Map<String, Value>, name: &str) -> Option<String> {
    match incident.get(name)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(reference) => match reference.get("value") {
            Some(Value::String(s)) => Some(s.clone()),
            _ => Some(Value::Object(reference.clone()).to_string()),
        },
        other => Some(other.to_string()),
    }
}

/// Keeps the local store aligned with the last observed upstream state.
pub struct IncidentMirror {
    store: Arc<dyn IncidentStore>,
    environment: String,
    project_name: String,
}

impl IncidentMirror {
    pub fn new(
        store: Arc<dyn IncidentStore>,
        environment: impl Into<String>,
        project_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            environment: environment.into(),
            project_name: project_name.into(),
        }
    }

    /// Build the fixed local projection of an upstream incident.
    ///
    /// # Errors
    /// Returns [`IncidentSyncError::MirrorWriteFailed`] if the incident is not a
    /// JSON object or has no non-empty string `sys_id`.
    pub fn project(&self, incident: &Value) -> Result<MirroredIncident, IncidentSyncError> {
        let Some(obj) = incident.as_object() else {
            return Err(IncidentSyncError::mirror_write_failed(
                UNKNOWN_INCIDENT_ID,
                "incident is not a JSON object",
            ));
        };

        let incident_id = match obj.get("sys_id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            _ => {
                return Err(IncidentSyncError::mirror_write_failed(
                    UNKNOWN_INCIDENT_ID,
                    "incident has no sys_id",
                ));
            }
        };

        Ok(MirroredIncident {
            incident_id,
            created_at: field(obj, "sys_created_on"),
            updated_at: field(obj, "sys_updated_on"),
            number: field(obj, "number"),
            short_description: field(obj, "short_description"),
            description: field(obj, "description"),
            priority: field(obj, "priority"),
            impact: field(obj, "impact"),
            urgency: field(obj, "urgency"),
            state: field(obj, "state"),
            assigned_to: field(obj, "assigned_to"),
            category: field(obj, "category"),
            subcategory: field(obj, "subcategory"),
            caller_id: field(obj, "caller_id"),
            opened_by: field(obj, "opened_by"),
            closed_at: field(obj, "closed_at"),
            resolved_at: field(obj, "resolved_at"),
            environment: self.environment.clone(),
            project_name: self.project_name.clone(),
        })
    }

    /// Mirror an incident; failures are logged and dropped.
    pub async fn upsert(&self, incident: &Value) {
        if let Err(e) = self.try_upsert(incident).await {
            warn!(error = %e, "Incident not mirrored");
        }
    }

    /// Mirror an incident, replacing the whole row for its `sys_id`.
    ///
    /// # Errors
    /// Returns [`IncidentSyncError::MirrorWriteFailed`] when projection or the
    /// store write fails.
    pub async fn try_upsert(&self, incident: &Value) -> Result<MirroredIncident, IncidentSyncError> {
        let mirrored = self.project(incident)?;
        self.store
            .put(mirrored.clone())
            .await
            .map_err(|e| IncidentSyncError::mirror_write_failed(&mirrored.incident_id, e.to_string()))?;

        debug!(incident_id = %mirrored.incident_id, "Incident mirrored");
        Ok(mirrored)
    }
}
