#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end behaviour of the gateway over in-process adapters.

use std::sync::Arc;

use async_trait::async_trait;
use incident_sync::config::IncidentSyncConfig;
use incident_sync::domain::ports::{SecretStore, UpstreamTransport};
use incident_sync::domain::repo::{CallLogStore, IncidentStore};
use incident_sync::domain::router::IncidentRouter;
use incident_sync::gateway::{GatewayPorts, assemble};
use incident_sync::infra::storage::InMemoryStore;
use incident_sync::{
    Credentials, HttpMethod, InboundRequest, IncidentSyncApi, IncidentSyncError, UpstreamRequest,
    UpstreamResponse,
};
use parking_lot::Mutex;
use serde_json::{Value, json};

const CREDS: &str =
    r#"{"instance_url":"https://acme.example.com","username":"svc","password":"hunter2"}"#;

type EventLog = Arc<Mutex<Vec<String>>>;

struct MockSecretStore {
    value: Option<&'static str>,
    events: EventLog,
}

#[async_trait]
impl SecretStore for MockSecretStore {
    async fn get_secret(&self, secret_id: &str) -> anyhow::Result<String> {
        self.events.lock().push("credentials".to_owned());
        self.value
            .map(str::to_owned)
            .ok_or_else(|| anyhow::anyhow!("secret {secret_id} missing"))
    }
}

enum Reply {
    Respond(u16, Value),
    Fail(&'static str),
}

struct MockTransport {
    reply: Reply,
    calls: Mutex<Vec<UpstreamRequest>>,
    events: EventLog,
}

#[async_trait]
impl UpstreamTransport for MockTransport {
    async fn send(
        &self,
        credentials: &Credentials,
        req: UpstreamRequest,
    ) -> Result<UpstreamResponse, IncidentSyncError> {
        assert_eq!(credentials.username, "svc");
        self.events.lock().push("transport".to_owned());
        self.calls.lock().push(req);
        match &self.reply {
            Reply::Respond(status_code, data) => Ok(UpstreamResponse {
                status_code: *status_code,
                data: data.clone(),
            }),
            Reply::Fail(message) => Err(IncidentSyncError::transport(*message)),
        }
    }
}

struct Harness {
    gateway: Arc<IncidentRouter>,
    transport: Arc<MockTransport>,
    store: Arc<InMemoryStore>,
    events: EventLog,
}

impl Harness {
    fn new(reply: Reply) -> Self {
        Self::with_secret(Some(CREDS), reply)
    }

    fn with_secret(secret: Option<&'static str>, reply: Reply) -> Self {
        let events = EventLog::default();
        let transport = Arc::new(MockTransport {
            reply,
            calls: Mutex::new(Vec::new()),
            events: events.clone(),
        });
        let store = Arc::new(InMemoryStore::new());
        let cfg = IncidentSyncConfig {
            environment: "test".to_owned(),
            project_name: "itsm-bridge".to_owned(),
            ..Default::default()
        };
        let gateway = assemble(
            &cfg,
            GatewayPorts {
                secrets: Arc::new(MockSecretStore {
                    value: secret,
                    events: events.clone(),
                }),
                transport: transport.clone(),
                incidents: store.clone(),
                call_logs: store.clone(),
            },
        );
        Self {
            gateway,
            transport,
            store,
            events,
        }
    }

    fn calls(&self) -> Vec<UpstreamRequest> {
        self.transport.calls.lock().clone()
    }

    async fn mirrored(&self, id: &str) -> Option<incident_sync::MirroredIncident> {
        IncidentStore::get(self.store.as_ref(), id).await.unwrap()
    }
}

fn body(envelope: &incident_sync::Envelope) -> Value {
    serde_json::to_value(envelope).unwrap()
}

#[tokio::test]
async fn list_returns_collection_and_mirrors_each_incident() {
    let h = Harness::new(Reply::Respond(
        200,
        json!({"result": [{"sys_id": "a1", "number": "INC001", "priority": "1"}]}),
    ));

    let env = h
        .gateway
        .handle(InboundRequest::new(http::Method::GET).with_query("priority", "1"))
        .await;

    assert_eq!(env.status_code, 200);
    assert_eq!(
        body(&env),
        json!({"success": true, "data": [{"sys_id": "a1", "number": "INC001", "priority": "1"}], "count": 1})
    );

    let calls = h.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, HttpMethod::Get);
    assert_eq!(calls[0].path, "/api/now/table/incident");
    assert_eq!(calls[0].query, vec![("priority".to_owned(), "1".to_owned())]);

    let row = h.mirrored("a1").await.unwrap();
    assert_eq!(row.number.as_deref(), Some("INC001"));
    assert_eq!(row.environment, "test");
    assert_eq!(row.project_name, "itsm-bridge");
    assert_eq!(h.store.call_logs_len(), 1);
}

#[tokio::test]
async fn list_without_array_result_is_empty() {
    let h = Harness::new(Reply::Respond(200, json!({"result": {"sys_id": "a1"}})));

    let env = h.gateway.handle(InboundRequest::new(http::Method::GET)).await;

    assert_eq!(body(&env), json!({"success": true, "data": [], "count": 0}));
    assert_eq!(h.store.incidents_len(), 0);
}

#[tokio::test]
async fn get_returns_incident_and_mirrors_it() {
    let h = Harness::new(Reply::Respond(
        200,
        json!({"result": {"sys_id": "a1", "state": "2"}}),
    ));

    let env = h
        .gateway
        .handle(InboundRequest::new(http::Method::GET).with_id("a1"))
        .await;

    assert_eq!(env.status_code, 200);
    assert_eq!(
        body(&env),
        json!({"success": true, "data": {"sys_id": "a1", "state": "2"}})
    );
    assert_eq!(h.calls()[0].path, "/api/now/table/incident/a1");
    assert_eq!(h.mirrored("a1").await.unwrap().state.as_deref(), Some("2"));
}

#[tokio::test]
async fn get_missing_incident_is_404_without_mirror() {
    let h = Harness::new(Reply::Respond(
        404,
        json!({"error": {"message": "No Record found"}}),
    ));

    let env = h
        .gateway
        .handle(InboundRequest::new(http::Method::GET).with_id("zz"))
        .await;

    assert_eq!(env.status_code, 404);
    assert_eq!(
        body(&env),
        json!({"success": false, "error": "Incident not found"})
    );
    assert_eq!(h.store.incidents_len(), 0);
    assert_eq!(h.store.call_logs_len(), 1);
}

#[tokio::test]
async fn create_returns_201_and_mirrors_created_incident() {
    let h = Harness::new(Reply::Respond(
        201,
        json!({"result": {"sys_id": "b2", "short_description": "x"}}),
    ));

    let env = h
        .gateway
        .handle(InboundRequest::new(http::Method::POST).with_body(r#"{"short_description":"x"}"#))
        .await;

    assert_eq!(env.status_code, 201);
    assert_eq!(env.data, Some(json!({"sys_id": "b2", "short_description": "x"})));

    let calls = h.calls();
    assert_eq!(calls[0].method, HttpMethod::Post);
    assert_eq!(calls[0].body, Some(json!({"short_description": "x"})));
    assert_eq!(
        h.mirrored("b2").await.unwrap().short_description.as_deref(),
        Some("x")
    );
}

#[tokio::test]
async fn update_sends_partial_body_to_item_path() {
    let h = Harness::new(Reply::Respond(
        200,
        json!({"result": {"sys_id": "a1", "state": "6"}}),
    ));

    let env = h
        .gateway
        .handle(
            InboundRequest::new(http::Method::PUT)
                .with_id("a1")
                .with_body(r#"{"state":"6"}"#),
        )
        .await;

    assert_eq!(env.status_code, 200);
    assert!(env.success);
    let calls = h.calls();
    assert_eq!(calls[0].method, HttpMethod::Put);
    assert_eq!(calls[0].path, "/api/now/table/incident/a1");
    assert_eq!(calls[0].body, Some(json!({"state": "6"})));
    assert_eq!(h.mirrored("a1").await.unwrap().state.as_deref(), Some("6"));
}

#[tokio::test]
async fn update_of_missing_incident_is_404() {
    let h = Harness::new(Reply::Respond(404, json!({"error": {}})));

    let env = h
        .gateway
        .handle(InboundRequest::new(http::Method::PUT).with_id("zz"))
        .await;

    assert_eq!(env.status_code, 404);
    assert_eq!(env.error.as_deref(), Some("Incident not found"));
}

#[tokio::test]
async fn transport_failure_is_logged_once_and_reported() {
    let h = Harness::new(Reply::Fail("connection refused"));

    let env = h.gateway.handle(InboundRequest::new(http::Method::GET)).await;

    assert_eq!(env.status_code, 500);
    assert!(!env.success);
    assert_eq!(env.error.as_deref(), Some("Failed to retrieve incidents"));
    assert!(env.details.as_deref().unwrap().contains("connection refused"));

    assert_eq!(h.store.call_logs_len(), 1);
    assert_eq!(h.store.incidents_len(), 0);
}

#[tokio::test]
async fn call_log_of_transport_failure_has_status_500_and_error() {
    let events = EventLog::default();
    let transport = Arc::new(MockTransport {
        reply: Reply::Fail("dns lookup failed"),
        calls: Mutex::new(Vec::new()),
        events: events.clone(),
    });
    let logs = Arc::new(CapturingCallLogs::default());
    let gateway = assemble(
        &IncidentSyncConfig::default(),
        GatewayPorts {
            secrets: Arc::new(MockSecretStore {
                value: Some(CREDS),
                events,
            }),
            transport,
            incidents: Arc::new(InMemoryStore::new()),
            call_logs: logs.clone(),
        },
    );

    gateway
        .handle(InboundRequest::new(http::Method::GET).with_id("a1"))
        .await;

    let records = logs.records.lock();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status_code, 500);
    assert_eq!(records[0].endpoint, "/api/now/table/incident/a1");
    assert_eq!(records[0].method, HttpMethod::Get);
    assert!(records[0].error.as_deref().unwrap().contains("dns lookup failed"));
}

#[derive(Default)]
struct CapturingCallLogs {
    records: Mutex<Vec<incident_sync::CallLogRecord>>,
}

#[async_trait]
impl CallLogStore for CapturingCallLogs {
    async fn insert(&self, record: incident_sync::CallLogRecord) -> anyhow::Result<()> {
        self.records.lock().push(record);
        Ok(())
    }

    async fn get(&self, request_id: uuid::Uuid) -> anyhow::Result<Option<incident_sync::CallLogRecord>> {
        Ok(self
            .records
            .lock()
            .iter()
            .find(|r| r.request_id == request_id)
            .cloned())
    }
}

#[tokio::test]
async fn rejected_status_is_500_with_status_and_body_in_details() {
    let h = Harness::new(Reply::Respond(
        403,
        json!({"error": {"message": "Insufficient rights"}}),
    ));

    let env = h
        .gateway
        .handle(InboundRequest::new(http::Method::POST).with_body("{}"))
        .await;

    assert_eq!(env.status_code, 500);
    assert_eq!(env.error.as_deref(), Some("Failed to create incident"));
    let details = env.details.unwrap();
    assert!(details.contains("403"));
    assert!(details.contains("Insufficient rights"));
    assert_eq!(h.store.incidents_len(), 0);
}

#[tokio::test]
async fn list_404_is_a_failure_not_not_found() {
    let h = Harness::new(Reply::Respond(404, json!("gone")));

    let env = h.gateway.handle(InboundRequest::new(http::Method::GET)).await;

    assert_eq!(env.status_code, 500);
    assert_eq!(env.details.as_deref(), Some("upstream returned status 404: gone"));
}

#[tokio::test]
async fn put_without_id_is_400_without_upstream_call() {
    let h = Harness::new(Reply::Respond(200, json!({"result": {}})));

    let env = h
        .gateway
        .handle(InboundRequest::new(http::Method::PUT).with_body(r#"{"state":"2"}"#))
        .await;

    assert_eq!(env.status_code, 400);
    assert_eq!(
        body(&env),
        json!({"success": false, "error": "Incident ID is required for updates"})
    );
    assert!(h.calls().is_empty());
    assert_eq!(h.store.call_logs_len(), 0);
}

#[tokio::test]
async fn unsupported_method_is_405_after_credential_fetch() {
    for method in [http::Method::DELETE, http::Method::PATCH, http::Method::OPTIONS] {
        let h = Harness::new(Reply::Respond(200, json!({"result": {}})));

        let env = h
            .gateway
            .handle(InboundRequest::new(method).with_id("a1"))
            .await;

        assert_eq!(env.status_code, 405);
        assert_eq!(env.error.as_deref(), Some("Method not allowed"));
        assert!(h.calls().is_empty());
        assert_eq!(*h.events.lock(), vec!["credentials".to_owned()]);
    }
}

#[tokio::test]
async fn credentials_are_fetched_before_the_upstream_call() {
    let h = Harness::new(Reply::Respond(200, json!({"result": []})));

    h.gateway.handle(InboundRequest::new(http::Method::GET)).await;

    assert_eq!(
        *h.events.lock(),
        vec!["credentials".to_owned(), "transport".to_owned()]
    );
}

#[tokio::test]
async fn credential_failure_is_500_without_details() {
    let h = Harness::with_secret(None, Reply::Respond(200, json!({"result": []})));

    let env = h.gateway.handle(InboundRequest::new(http::Method::GET)).await;

    assert_eq!(env.status_code, 500);
    assert_eq!(
        body(&env),
        json!({"success": false, "error": "Internal server error"})
    );
    assert!(h.calls().is_empty());
}

#[tokio::test]
async fn malformed_secret_is_500_without_details() {
    let h = Harness::with_secret(Some("not-json"), Reply::Respond(200, json!({"result": []})));

    let env = h.gateway.handle(InboundRequest::new(http::Method::GET)).await;

    assert_eq!(env.status_code, 500);
    assert!(env.details.is_none());
}

#[tokio::test]
async fn invalid_json_body_is_500_with_details() {
    let h = Harness::new(Reply::Respond(201, json!({"result": {"sys_id": "b2"}})));

    let env = h
        .gateway
        .handle(InboundRequest::new(http::Method::POST).with_body("{oops"))
        .await;

    assert_eq!(env.status_code, 500);
    assert_eq!(env.error.as_deref(), Some("Internal server error"));
    assert!(env.details.is_some());
    assert!(h.calls().is_empty());
}

#[tokio::test]
async fn empty_body_is_sent_as_empty_object() {
    let h = Harness::new(Reply::Respond(201, json!({"result": {"sys_id": "b2"}})));

    h.gateway.handle(InboundRequest::new(http::Method::POST)).await;

    assert_eq!(h.calls()[0].body, Some(json!({})));
}

#[tokio::test]
async fn success_without_sys_id_is_returned_but_not_mirrored() {
    let h = Harness::new(Reply::Respond(
        200,
        json!({"result": [{"number": "INC9"}, {"sys_id": "c3"}]}),
    ));

    let env = h.gateway.handle(InboundRequest::new(http::Method::GET)).await;

    assert_eq!(env.count, Some(2));
    assert_eq!(h.store.incidents_len(), 1);
    assert!(h.mirrored("c3").await.is_some());
}

/// Store whose every write fails; counts the attempts.
#[derive(Default)]
struct BrokenStore {
    writes: Mutex<usize>,
}

#[async_trait]
impl IncidentStore for BrokenStore {
    async fn put(&self, _incident: incident_sync::MirroredIncident) -> anyhow::Result<()> {
        *self.writes.lock() += 1;
        anyhow::bail!("disk full")
    }

    async fn get(&self, _incident_id: &str) -> anyhow::Result<Option<incident_sync::MirroredIncident>> {
        anyhow::bail!("disk full")
    }
}

#[async_trait]
impl CallLogStore for BrokenStore {
    async fn insert(&self, _record: incident_sync::CallLogRecord) -> anyhow::Result<()> {
        *self.writes.lock() += 1;
        anyhow::bail!("disk full")
    }

    async fn get(&self, _request_id: uuid::Uuid) -> anyhow::Result<Option<incident_sync::CallLogRecord>> {
        anyhow::bail!("disk full")
    }
}

async fn handle_with_broken_stores(reply: Reply, req: InboundRequest) -> (Value, u16, usize) {
    let events = EventLog::default();
    let store = Arc::new(BrokenStore::default());
    let gateway = assemble(
        &IncidentSyncConfig::default(),
        GatewayPorts {
            secrets: Arc::new(MockSecretStore {
                value: Some(CREDS),
                events: events.clone(),
            }),
            transport: Arc::new(MockTransport {
                reply,
                calls: Mutex::new(Vec::new()),
                events,
            }),
            incidents: store.clone(),
            call_logs: store.clone(),
        },
    );

    let env = gateway.handle(req).await;
    let writes = *store.writes.lock();
    (body(&env), env.status_code, writes)
}

#[tokio::test]
async fn store_failures_do_not_change_success_envelopes() {
    let (json, status, writes) = handle_with_broken_stores(
        Reply::Respond(200, json!({"result": {"sys_id": "a1", "state": "2"}})),
        InboundRequest::new(http::Method::GET).with_id("a1"),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(json, json!({"success": true, "data": {"sys_id": "a1", "state": "2"}}));
    assert_eq!(writes, 2);

    let (json, status, writes) = handle_with_broken_stores(
        Reply::Respond(200, json!({"result": [{"sys_id": "a1"}, {"sys_id": "a2"}]})),
        InboundRequest::new(http::Method::GET),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(json["success"], true);
    assert_eq!(json["count"], 2);
    assert_eq!(writes, 3);

    let (json, status, writes) = handle_with_broken_stores(
        Reply::Respond(201, json!({"result": {"sys_id": "b2"}})),
        InboundRequest::new(http::Method::POST).with_body(r#"{"short_description":"x"}"#),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(json, json!({"success": true, "data": {"sys_id": "b2"}}));
    assert_eq!(writes, 2);
}

#[tokio::test]
async fn telemetry_failure_does_not_change_transport_failure_envelope() {
    let (json, status, writes) = handle_with_broken_stores(
        Reply::Fail("connection reset"),
        InboundRequest::new(http::Method::GET).with_id("a1"),
    )
    .await;

    assert_eq!(status, 500);
    assert_eq!(json["error"], "Failed to retrieve incident");
    assert_eq!(json["details"], "transport error: connection reset");
    assert_eq!(writes, 1);
}
