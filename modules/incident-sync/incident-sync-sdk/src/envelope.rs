//! Uniform response envelope returned to callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error text for a missing incident.
pub const NOT_FOUND_MESSAGE: &str = "Incident not found";
/// Error text for invocation-level failures.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
/// Error text for `PUT` without an identifier.
pub const ID_REQUIRED_MESSAGE: &str = "Incident ID is required for updates";
/// Error text for unsupported methods.
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";

/// Response envelope: `{success, data|error, count?, details?}`.
///
/// `status_code` is the HTTP status of the response and is not part of the
/// JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(skip)]
    pub status_code: u16,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Envelope {
    /// Successful single-record response.
    #[must_use]
    pub fn ok(status_code: u16, data: Option<Value>) -> Self {
        Self {
            status_code,
            success: true,
            data,
            count: None,
            error: None,
            details: None,
        }
    }

    /// Successful collection response; `count` is the number of items.
    #[must_use]
    pub fn collection(status_code: u16, items: Vec<Value>) -> Self {
        let count = items.len();
        Self {
            status_code,
            success: true,
            data: Some(Value::Array(items)),
            count: Some(count),
            error: None,
            details: None,
        }
    }

    /// Failed response.
    #[must_use]
    pub fn failure(status_code: u16, error: impl Into<String>) -> Self {
        Self {
            status_code,
            success: false,
            data: None,
            count: None,
            error: Some(error.into()),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::failure(404, NOT_FOUND_MESSAGE)
    }

    #[must_use]
    pub fn internal_error() -> Self {
        Self::failure(500, INTERNAL_ERROR_MESSAGE)
    }

    #[must_use]
    pub fn id_required() -> Self {
        Self::failure(400, ID_REQUIRED_MESSAGE)
    }

    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self::failure(405, METHOD_NOT_ALLOWED_MESSAGE)
    }
}
