//! reqwest-backed transport to the ticketing table API.

use std::time::Duration;

use async_trait::async_trait;
use incident_sync_sdk::{
    Credentials, HttpMethod, IncidentSyncError, UpstreamRequest, UpstreamResponse,
};
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::{Instrument, debug, info_span, instrument};

use crate::domain::ports::UpstreamTransport;

/// Authenticated JSON client for the ticketing service.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// # Errors
    /// Returns [`IncidentSyncError::Internal`] if the HTTP client cannot be built.
    pub fn new(timeout: Option<Duration>) -> Result<Self, IncidentSyncError> {
        let mut builder = reqwest::Client::builder().pool_max_idle_per_host(10);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| IncidentSyncError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn build_url(instance_url: &str, req: &UpstreamRequest) -> String {
        let base = instance_url.trim_end_matches('/');
        let mut url = format!("{base}{}", req.path);

        if !req.query.is_empty() {
            let query: String = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(req.query.iter())
                .finish();
            url.push('?');
            url.push_str(&query);
        }

        url
    }

    fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
        }
    }
}

/// Render an error with its source chain; reqwest keeps the useful part
/// (DNS, refused, TLS) in the sources.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[async_trait]
impl UpstreamTransport for HttpTransport {
    #[instrument(skip_all, fields(method = %req.method, path = %req.path))]
    async fn send(
        &self,
        credentials: &Credentials,
        req: UpstreamRequest,
    ) -> Result<UpstreamResponse, IncidentSyncError> {
        let url = Self::build_url(&credentials.instance_url, &req);

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(req.method), &url)
            .basic_auth(
                &credentials.username,
                Some(credentials.password.expose_secret()),
            )
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .instrument(info_span!("http_request"))
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IncidentSyncError::transport(format!("request timed out: {}", error_chain(&e)))
                } else if e.is_connect() {
                    IncidentSyncError::transport(format!("connection error: {}", error_chain(&e)))
                } else {
                    IncidentSyncError::transport(format!("request error: {}", error_chain(&e)))
                }
            })?;

        let status_code = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            IncidentSyncError::transport(format!(
                "failed to read response body: {}",
                error_chain(&e)
            ))
        })?;

        let data = serde_json::from_str(&text).unwrap_or(Value::String(text));
        debug!(status_code, "Upstream responded");

        Ok(UpstreamResponse { status_code, data })
    }
}
