use async_trait::async_trait;
use incident_sync_sdk::{CallLogRecord, MirroredIncident};
use uuid::Uuid;

/// Local collection of mirrored incidents keyed by `incident_id`.
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Replace the whole row for `incident.incident_id`.
    async fn put(&self, incident: MirroredIncident) -> anyhow::Result<()>;

    async fn get(&self, incident_id: &str) -> anyhow::Result<Option<MirroredIncident>>;
}

/// Local collection of call-log records keyed by `request_id`.
#[async_trait]
pub trait CallLogStore: Send + Sync {
    /// Insert a new record. Records are write-once.
    async fn insert(&self, record: CallLogRecord) -> anyhow::Result<()>;

    async fn get(&self, request_id: Uuid) -> anyhow::Result<Option<CallLogRecord>>;
}
