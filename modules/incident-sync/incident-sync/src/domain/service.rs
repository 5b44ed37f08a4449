//! Incident operations against the ticketing table API.
//!
//! Every operation runs through [`IncidentService::execute`]: one upstream
//! call, one telemetry record, then classification of the outcome into an
//! [`Envelope`]. Operations differ only in their [`OperationSpec`].

use std::sync::Arc;
use std::time::Instant;

use incident_sync_sdk::{
    Credentials, Envelope, HttpMethod, IncidentSyncError, UpstreamRequest, UpstreamResponse,
};
use serde_json::Value;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::mirror::IncidentMirror;
use super::ports::UpstreamTransport;
use super::telemetry::{CallAttempt, CallTelemetry, SYNTHESIZED_FAILURE_STATUS};

/// Upstream table endpoint for incidents.
pub const INCIDENT_TABLE_PATH: &str = "/api/now/table/incident";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResultShape {
    /// `result` is an array; every element is mirrored.
    Collection,
    /// `result` is a single incident.
    Single,
}

#[derive(Debug, Clone, Copy)]
struct OperationSpec {
    method: HttpMethod,
    success_status: u16,
    /// Upstream 404 maps to "Incident not found" instead of a failure.
    not_found_eligible: bool,
    shape: ResultShape,
    failure_message: &'static str,
}

const LIST: OperationSpec = OperationSpec {
    method: HttpMethod::Get,
    success_status: 200,
    not_found_eligible: false,
    shape: ResultShape::Collection,
    failure_message: "Failed to retrieve incidents",
};

const GET: OperationSpec = OperationSpec {
    method: HttpMethod::Get,
    success_status: 200,
    not_found_eligible: true,
    shape: ResultShape::Single,
    failure_message: "Failed to retrieve incident",
};

const CREATE: OperationSpec = OperationSpec {
    method: HttpMethod::Post,
    success_status: 201,
    not_found_eligible: false,
    shape: ResultShape::Single,
    failure_message: "Failed to create incident",
};

const UPDATE: OperationSpec = OperationSpec {
    method: HttpMethod::Put,
    success_status: 200,
    not_found_eligible: true,
    shape: ResultShape::Single,
    failure_message: "Failed to update incident",
};

fn item_path(id: &str) -> String {
    format!("{INCIDENT_TABLE_PATH}/{}", urlencoding::encode(id))
}

/// Body text used in failure details: raw text stays raw, JSON is re-serialized.
fn body_text(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// List, get, create and update incidents.
pub struct IncidentService {
    transport: Arc<dyn UpstreamTransport>,
    telemetry: CallTelemetry,
    mirror: IncidentMirror,
}

impl IncidentService {
    pub fn new(
        transport: Arc<dyn UpstreamTransport>,
        telemetry: CallTelemetry,
        mirror: IncidentMirror,
    ) -> Self {
        Self {
            transport,
            telemetry,
            mirror,
        }
    }

    /// List incidents; `query` is forwarded verbatim.
    #[instrument(skip_all, fields(params = query.len()))]
    pub async fn list_incidents(
        &self,
        credentials: &Credentials,
        query: Vec<(String, String)>,
    ) -> Envelope {
        let req = UpstreamRequest {
            method: LIST.method,
            path: INCIDENT_TABLE_PATH.to_owned(),
            query,
            body: None,
        };
        self.execute(&LIST, credentials, req).await
    }

    #[instrument(skip(self, credentials))]
    pub async fn get_incident(&self, credentials: &Credentials, id: &str) -> Envelope {
        let req = UpstreamRequest {
            method: GET.method,
            path: item_path(id),
            query: Vec::new(),
            body: None,
        };
        self.execute(&GET, credentials, req).await
    }

    #[instrument(skip_all)]
    pub async fn create_incident(&self, credentials: &Credentials, body: Value) -> Envelope {
        let req = UpstreamRequest {
            method: CREATE.method,
            path: INCIDENT_TABLE_PATH.to_owned(),
            query: Vec::new(),
            body: Some(body),
        };
        self.execute(&CREATE, credentials, req).await
    }

    /// Update an incident with a partial body.
    #[instrument(skip(self, credentials, body))]
    pub async fn update_incident(
        &self,
        credentials: &Credentials,
        id: &str,
        body: Value,
    ) -> Envelope {
        let req = UpstreamRequest {
            method: UPDATE.method,
            path: item_path(id),
            query: Vec::new(),
            body: Some(body),
        };
        self.execute(&UPDATE, credentials, req).await
    }

    async fn execute(
        &self,
        op: &OperationSpec,
        credentials: &Credentials,
        req: UpstreamRequest,
    ) -> Envelope {
        let request_id = Uuid::new_v4();
        let endpoint = req.path.clone();
        let start = Instant::now();

        let outcome = self.transport.send(credentials, req).await;
        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(response) => {
                let error = (!response.is_success())
                    .then(|| format!("upstream returned status {}", response.status_code));
                self.telemetry
                    .record(CallAttempt {
                        request_id,
                        endpoint: &endpoint,
                        method: op.method,
                        status_code: response.status_code,
                        latency_ms,
                        error,
                    })
                    .await;

                info!(
                    %request_id,
                    endpoint = %endpoint,
                    status_code = response.status_code,
                    latency_ms,
                    "Upstream call completed"
                );
                self.classify(op, response).await
            }
            Err(e) => {
                self.telemetry
                    .record(CallAttempt {
                        request_id,
                        endpoint: &endpoint,
                        method: op.method,
                        status_code: SYNTHESIZED_FAILURE_STATUS,
                        latency_ms,
                        error: Some(e.to_string()),
                    })
                    .await;

                warn!(%request_id, endpoint = %endpoint, error = %e, "Upstream call failed");
                Envelope::failure(500, op.failure_message).with_details(e.to_string())
            }
        }
    }

    async fn classify(&self, op: &OperationSpec, response: UpstreamResponse) -> Envelope {
        if !response.is_success() {
            if response.status_code == 404 && op.not_found_eligible {
                return Envelope::not_found();
            }
            let rejected =
                IncidentSyncError::upstream_rejected(response.status_code, body_text(&response.data));
            return Envelope::failure(500, op.failure_message).with_details(rejected.to_string());
        }

        let result = response.into_result();

        match op.shape {
            ResultShape::Collection => {
                let items = match result {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                };
                for item in &items {
                    self.mirror.upsert(item).await;
                }
                Envelope::collection(op.success_status, items)
            }
            ResultShape::Single => {
                if let Some(incident) = &result {
                    self.mirror.upsert(incident).await;
                }
                Envelope::ok(op.success_status, result)
            }
        }
    }
}
