//! Incident sync models.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::IncidentSyncError;

/// HTTP methods used against the ticketing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    /// Convert to uppercase string representation.
    #[must_use]
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = IncidentSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            other => Err(IncidentSyncError::internal(format!(
                "unsupported upstream method: {other}"
            ))),
        }
    }
}

/// Ticketing service credentials.
///
/// The password never leaves the process: `Debug` redacts it and the type is
/// not serializable.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Base URL of the ticketing instance, e.g. `https://acme.service-now.com`.
    pub instance_url: String,
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(
        instance_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            instance_url: instance_url.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Request sent to the ticketing service.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub method: HttpMethod,
    /// Path below the instance URL, e.g. `/api/now/table/incident`.
    pub path: String,
    /// Query parameters, forwarded verbatim.
    pub query: Vec<(String, String)>,
    /// JSON body, serialized when present.
    pub body: Option<Value>,
}

/// Response received from the ticketing service.
///
/// `data` holds the parsed JSON body, or the raw text as a JSON string when the
/// body is not JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status_code: u16,
    pub data: Value,
}

impl UpstreamResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Take the `result` member of a table API response, if any.
    #[must_use]
    pub fn into_result(self) -> Option<Value> {
        match self.data {
            Value::Object(mut obj) => obj.remove("result"),
            _ => None,
        }
    }
}

/// Local projection of an upstream incident, keyed by `incident_id`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MirroredIncident {
    /// Upstream `sys_id`.
    pub incident_id: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub number: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub impact: Option<String>,
    pub urgency: Option<String>,
    pub state: Option<String>,
    pub assigned_to: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub caller_id: Option<String>,
    pub opened_by: Option<String>,
    pub closed_at: Option<String>,
    pub resolved_at: Option<String>,
    /// Deployment environment tag.
    pub environment: String,
    pub project_name: String,
}

/// One upstream call attempt. Write-once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLogRecord {
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Upstream path without the query string.
    pub endpoint: String,
    pub method: HttpMethod,
    /// Upstream status, or 500 when no status was obtained.
    pub status_code: u16,
    pub response_time_ms: u64,
    pub environment: String,
    pub project_name: String,
    pub error: Option<String>,
}

/// Inbound request as seen by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    pub method: http::Method,
    /// Path identifier of a single incident.
    pub id: Option<String>,
    pub query: Vec<(String, String)>,
    /// Raw request body.
    pub body: Option<String>,
}

impl InboundRequest {
    #[must_use]
    pub fn new(method: http::Method) -> Self {
        Self {
            method,
            id: None,
            query: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}
