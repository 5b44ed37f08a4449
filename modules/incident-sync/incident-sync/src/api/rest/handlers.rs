use std::any::Any;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::extract::{Extension, Path, RawQuery};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use incident_sync_sdk::{Envelope, InboundRequest, IncidentSyncApi, IncidentSyncError};
use tracing::{Span, error, instrument, warn};

use super::response::EnvelopeResponse;

pub const ROUTE_NOT_FOUND_MESSAGE: &str = "Route not found";
pub const INVALID_REQUEST_MESSAGE: &str = "Invalid request";

/// Extractor rejections keep their status but are rendered as envelopes.
fn rejected(status: StatusCode, details: String) -> EnvelopeResponse {
    warn!(status = status.as_u16(), details = %details, "Rejected inbound request");
    EnvelopeResponse(
        Envelope::failure(status.as_u16(), INVALID_REQUEST_MESSAGE).with_details(details),
    )
}

fn inbound_request(
    method: Method,
    id: Option<String>,
    query: Option<String>,
    body: Bytes,
) -> Result<InboundRequest, IncidentSyncError> {
    let query: Vec<(String, String)> = match query.as_deref() {
        None | Some("") => Vec::new(),
        Some(raw) => serde_urlencoded::from_str(raw)
            .map_err(|e| IncidentSyncError::internal(format!("invalid query string: {e}")))?,
    };

    let body = if body.is_empty() {
        None
    } else {
        Some(
            String::from_utf8(Vec::from(body))
                .map_err(|e| IncidentSyncError::internal(format!("body is not UTF-8: {e}")))?,
        )
    };

    Ok(InboundRequest {
        method,
        id,
        query,
        body,
    })
}

async fn handle(
    api: &dyn IncidentSyncApi,
    method: Method,
    id: Option<String>,
    query: Option<String>,
    body: Bytes,
) -> EnvelopeResponse {
    match inbound_request(method, id, query, body) {
        Ok(req) => EnvelopeResponse(api.handle(req).await),
        Err(e) => {
            error!(error = %e, "Malformed inbound request");
            EnvelopeResponse(Envelope::internal_error().with_details(e.to_string()))
        }
    }
}

/// `/incidents`: list or create.
#[instrument(skip_all, fields(method = %method))]
pub async fn handle_collection(
    method: Method,
    RawQuery(query): RawQuery,
    Extension(api): Extension<Arc<dyn IncidentSyncApi>>,
    body: Result<Bytes, BytesRejection>,
) -> EnvelopeResponse {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection.status(), rejection.body_text()),
    };
    handle(api.as_ref(), method, None, query, body).await
}

/// `/incidents/{id}`: get or update.
#[instrument(skip_all, fields(method = %method, id = tracing::field::Empty))]
pub async fn handle_item(
    method: Method,
    id: Result<Path<String>, PathRejection>,
    RawQuery(query): RawQuery,
    Extension(api): Extension<Arc<dyn IncidentSyncApi>>,
    body: Result<Bytes, BytesRejection>,
) -> EnvelopeResponse {
    let id = match id {
        Ok(Path(id)) => id,
        Err(rejection) => return rejected(rejection.status(), rejection.body_text()),
    };
    Span::current().record("id", id.as_str());

    let body = match body {
        Ok(body) => body,
        Err(rejection) => return rejected(rejection.status(), rejection.body_text()),
    };
    handle(api.as_ref(), method, Some(id), query, body).await
}

#[allow(clippy::unused_async)]
pub async fn route_not_found() -> EnvelopeResponse {
    EnvelopeResponse(Envelope::failure(404, ROUTE_NOT_FOUND_MESSAGE))
}

/// Render a recovered handler panic as the generic 500 envelope.
#[allow(clippy::needless_pass_by_value)]
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = message, "Handler panicked");
    EnvelopeResponse(Envelope::internal_error()).into_response()
}
