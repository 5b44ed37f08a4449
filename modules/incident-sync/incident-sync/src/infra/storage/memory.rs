use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use incident_sync_sdk::{CallLogRecord, MirroredIncident};
use uuid::Uuid;

use crate::domain::repo::{CallLogStore, IncidentStore};

/// Process-local store for mirrored incidents and call logs.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    incidents: DashMap<String, MirroredIncident>,
    call_logs: DashMap<Uuid, CallLogRecord>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn incidents_len(&self) -> usize {
        self.incidents.len()
    }

    #[must_use]
    pub fn call_logs_len(&self) -> usize {
        self.call_logs.len()
    }

    /// Snapshot of all call-log records, in no particular order.
    #[must_use]
    pub fn call_logs(&self) -> Vec<CallLogRecord> {
        self.call_logs.iter().map(|r| r.value().clone()).collect()
    }
}

#[async_trait]
impl IncidentStore for InMemoryStore {
    async fn put(&self, incident: MirroredIncident) -> anyhow::Result<()> {
        self.incidents.insert(incident.incident_id.clone(), incident);
        Ok(())
    }

    async fn get(&self, incident_id: &str) -> anyhow::Result<Option<MirroredIncident>> {
        Ok(self.incidents.get(incident_id).map(|r| r.value().clone()))
    }
}

#[async_trait]
impl CallLogStore for InMemoryStore {
    async fn insert(&self, record: CallLogRecord) -> anyhow::Result<()> {
        match self.call_logs.entry(record.request_id) {
            Entry::Occupied(_) => anyhow::bail!("call log {} already recorded", record.request_id),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn get(&self, request_id: Uuid) -> anyhow::Result<Option<CallLogRecord>> {
        Ok(self.call_logs.get(&request_id).map(|r| r.value().clone()))
    }
}
