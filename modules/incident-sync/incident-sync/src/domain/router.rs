//! Per-invocation request dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use incident_sync_sdk::{Envelope, InboundRequest, IncidentSyncApi, IncidentSyncError};
use serde_json::Value;
use tracing::{debug, error, instrument};

use super::credentials::CredentialProvider;
use super::service::IncidentService;

/// Maps an inbound method and path shape to an incident operation.
///
/// Holds no per-request state. Every outcome, including failures, is returned
/// as an [`Envelope`].
pub struct IncidentRouter {
    credentials: Arc<dyn CredentialProvider>,
    service: Arc<IncidentService>,
}

/// Parse the inbound body; an absent or blank body is an empty object.
fn parse_body(body: Option<&str>) -> Result<Value, IncidentSyncError> {
    match body.map(str::trim) {
        None | Some("") => Ok(Value::Object(serde_json::Map::new())),
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| IncidentSyncError::internal(format!("invalid JSON body: {e}"))),
    }
}

impl IncidentRouter {
    pub fn new(credentials: Arc<dyn CredentialProvider>, service: Arc<IncidentService>) -> Self {
        Self {
            credentials,
            service,
        }
    }

    #[instrument(skip(self, req), fields(method = %req.method, id = ?req.id))]
    pub async fn dispatch(&self, req: InboundRequest) -> Envelope {
        match self.try_dispatch(req).await {
            Ok(envelope) => envelope,
            Err(e @ IncidentSyncError::CredentialUnavailable { .. }) => {
                error!(error = %e, "Request aborted");
                Envelope::internal_error()
            }
            Err(e) => {
                error!(error = %e, "Request aborted");
                Envelope::internal_error().with_details(e.to_string())
            }
        }
    }

    async fn try_dispatch(&self, req: InboundRequest) -> Result<Envelope, IncidentSyncError> {
        let credentials = self.credentials.fetch().await?;
        let body = parse_body(req.body.as_deref())?;

        let envelope = match (req.method.as_str(), req.id.as_deref()) {
            ("GET", Some(id)) => self.service.get_incident(&credentials, id).await,
            ("GET", None) => self.service.list_incidents(&credentials, req.query).await,
            ("POST", _) => self.service.create_incident(&credentials, body).await,
            ("PUT", Some(id)) => self.service.update_incident(&credentials, id, body).await,
            ("PUT", None) => Envelope::id_required(),
            (other, _) => {
                debug!(method = other, "Unsupported method");
                Envelope::method_not_allowed()
            }
        };
        Ok(envelope)
    }
}

#[async_trait]
impl IncidentSyncApi for IncidentRouter {
    async fn handle(&self, req: InboundRequest) -> Envelope {
        self.dispatch(req).await
    }
}
