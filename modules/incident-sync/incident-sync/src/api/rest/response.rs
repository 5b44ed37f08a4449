use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use incident_sync_sdk::Envelope;

/// HTTP rendering of an [`Envelope`]: its status code plus the JSON body.
pub struct EnvelopeResponse(pub Envelope);

impl IntoResponse for EnvelopeResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0)).into_response()
    }
}

impl From<Envelope> for EnvelopeResponse {
    fn from(envelope: Envelope) -> Self {
        Self(envelope)
    }
}
