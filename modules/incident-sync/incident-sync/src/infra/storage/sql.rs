use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use incident_sync_sdk::{CallLogRecord, MirroredIncident};
use sea_orm::sea_query::{Alias, ColumnDef, Expr, OnConflict, Query, Table, TableCreateStatement};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, QueryResult};
use tracing::info;
use uuid::Uuid;

use crate::domain::repo::{CallLogStore, IncidentStore};

const INCIDENT_ID: &str = "incident_id";

/// Mirrored incident columns after the key, in insert order.
const INCIDENT_COLUMNS: [&str; 18] = [
    "created_at",
    "updated_at",
    "number",
    "short_description",
    "description",
    "priority",
    "impact",
    "urgency",
    "state",
    "assigned_to",
    "category",
    "subcategory",
    "caller_id",
    "opened_by",
    "closed_at",
    "resolved_at",
    "environment",
    "project_name",
];

const CALL_LOG_COLUMNS: [&str; 9] = [
    "request_id",
    "timestamp",
    "endpoint",
    "method",
    "status_code",
    "response_time",
    "environment",
    "project_name",
    "error",
];

/// Relational store for mirrored incidents and call logs.
///
/// Table names come from configuration; both tables are created on connect
/// when absent.
pub struct SqlStore {
    db: DatabaseConnection,
    incidents_table: String,
    call_logs_table: String,
}

impl SqlStore {
    /// Connect and ensure both tables exist.
    ///
    /// `sqlite::memory:` databases are private to one connection, so the pool
    /// is pinned to a single connection for them.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable or the schema cannot be created.
    pub async fn connect(
        dsn: &str,
        incidents_table: impl Into<String>,
        call_logs_table: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let mut opts = ConnectOptions::new(dsn.to_owned());
        opts.sqlx_logging(false);
        if dsn.contains(":memory:") {
            opts.max_connections(1).min_connections(1);
        }

        let db = Database::connect(opts)
            .await
            .with_context(|| format!("failed to connect to {dsn}"))?;

        let store = Self {
            db,
            incidents_table: incidents_table.into(),
            call_logs_table: call_logs_table.into(),
        };
        store.ensure_schema().await?;

        info!(
            incidents_table = %store.incidents_table,
            call_logs_table = %store.call_logs_table,
            "Local store ready"
        );
        Ok(store)
    }

    fn incidents_schema(&self) -> TableCreateStatement {
        let mut stmt = Table::create();
        stmt.table(Alias::new(self.incidents_table.as_str()))
            .if_not_exists()
            .col(
                ColumnDef::new(Alias::new(INCIDENT_ID))
                    .string()
                    .not_null()
                    .primary_key(),
            );
        for column in INCIDENT_COLUMNS {
            let mut def = ColumnDef::new(Alias::new(column));
            def.string();
            if matches!(column, "environment" | "project_name") {
                def.not_null();
            }
            stmt.col(&mut def);
        }
        stmt
    }

    fn call_logs_schema(&self) -> TableCreateStatement {
        Table::create()
            .table(Alias::new(self.call_logs_table.as_str()))
            .if_not_exists()
            .col(
                ColumnDef::new(Alias::new("request_id"))
                    .string()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(Alias::new("timestamp")).string().not_null())
            .col(ColumnDef::new(Alias::new("endpoint")).string().not_null())
            .col(ColumnDef::new(Alias::new("method")).string().not_null())
            .col(ColumnDef::new(Alias::new("status_code")).integer().not_null())
            .col(ColumnDef::new(Alias::new("response_time")).big_integer().not_null())
            .col(ColumnDef::new(Alias::new("environment")).string().not_null())
            .col(ColumnDef::new(Alias::new("project_name")).string().not_null())
            .col(ColumnDef::new(Alias::new("error")).string())
            .to_owned()
    }

    async fn ensure_schema(&self) -> anyhow::Result<()> {
        let backend = self.db.get_database_backend();
        for stmt in [self.incidents_schema(), self.call_logs_schema()] {
            self.db
                .execute(backend.build(&stmt))
                .await
                .context("failed to create local store schema")?;
        }
        Ok(())
    }
}

fn incident_from_row(row: &QueryResult) -> anyhow::Result<MirroredIncident> {
    let text = |column: &str| row.try_get::<Option<String>>("", column);
    Ok(MirroredIncident {
        incident_id: row.try_get("", INCIDENT_ID)?,
        created_at: text("created_at")?,
        updated_at: text("updated_at")?,
        number: text("number")?,
        short_description: text("short_description")?,
        description: text("description")?,
        priority: text("priority")?,
        impact: text("impact")?,
        urgency: text("urgency")?,
        state: text("state")?,
        assigned_to: text("assigned_to")?,
        category: text("category")?,
        subcategory: text("subcategory")?,
        caller_id: text("caller_id")?,
        opened_by: text("opened_by")?,
        closed_at: text("closed_at")?,
        resolved_at: text("resolved_at")?,
        environment: row.try_get("", "environment")?,
        project_name: row.try_get("", "project_name")?,
    })
}

fn call_log_from_row(row: &QueryResult) -> anyhow::Result<CallLogRecord> {
    let request_id: String = row.try_get("", "request_id")?;
    let timestamp: String = row.try_get("", "timestamp")?;
    let method: String = row.try_get("", "method")?;
    let status_code: i32 = row.try_get("", "status_code")?;
    let response_time: i64 = row.try_get("", "response_time")?;

    Ok(CallLogRecord {
        request_id: Uuid::parse_str(&request_id)?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp)?.with_timezone(&Utc),
        endpoint: row.try_get("", "endpoint")?,
        method: method.parse()?,
        status_code: u16::try_from(status_code)?,
        response_time_ms: u64::try_from(response_time)?,
        environment: row.try_get("", "environment")?,
        project_name: row.try_get("", "project_name")?,
        error: row.try_get("", "error")?,
    })
}

#[async_trait]
impl IncidentStore for SqlStore {
    async fn put(&self, incident: MirroredIncident) -> anyhow::Result<()> {
        let MirroredIncident {
            incident_id,
            created_at,
            updated_at,
            number,
            short_description,
            description,
            priority,
            impact,
            urgency,
            state,
            assigned_to,
            category,
            subcategory,
            caller_id,
            opened_by,
            closed_at,
            resolved_at,
            environment,
            project_name,
        } = incident;

        let mut stmt = Query::insert();
        stmt.into_table(Alias::new(self.incidents_table.as_str()))
            .columns(
                std::iter::once(INCIDENT_ID)
                    .chain(INCIDENT_COLUMNS)
                    .map(Alias::new),
            );
        stmt.values([
            incident_id.into(),
            created_at.into(),
            updated_at.into(),
            number.into(),
            short_description.into(),
            description.into(),
            priority.into(),
            impact.into(),
            urgency.into(),
            state.into(),
            assigned_to.into(),
            category.into(),
            subcategory.into(),
            caller_id.into(),
            opened_by.into(),
            closed_at.into(),
            resolved_at.into(),
            environment.into(),
            project_name.into(),
        ])
        .context("invalid incident row")?;
        stmt.on_conflict(
            OnConflict::column(Alias::new(INCIDENT_ID))
                .update_columns(INCIDENT_COLUMNS.map(Alias::new))
                .to_owned(),
        );

        let backend = self.db.get_database_backend();
        self.db.execute(backend.build(&stmt)).await?;
        Ok(())
    }

    async fn get(&self, incident_id: &str) -> anyhow::Result<Option<MirroredIncident>> {
        let stmt = Query::select()
            .columns(
                std::iter::once(INCIDENT_ID)
                    .chain(INCIDENT_COLUMNS)
                    .map(Alias::new),
            )
            .from(Alias::new(self.incidents_table.as_str()))
            .and_where(Expr::col(Alias::new(INCIDENT_ID)).eq(incident_id))
            .to_owned();

        let backend = self.db.get_database_backend();
        self.db
            .query_one(backend.build(&stmt))
            .await?
            .as_ref()
            .map(incident_from_row)
            .transpose()
    }
}

#[async_trait]
impl CallLogStore for SqlStore {
    async fn insert(&self, record: CallLogRecord) -> anyhow::Result<()> {
        let mut stmt = Query::insert();
        stmt.into_table(Alias::new(self.call_logs_table.as_str()))
            .columns(CALL_LOG_COLUMNS.map(Alias::new));
        stmt.values([
            record.request_id.to_string().into(),
            record.timestamp.to_rfc3339().into(),
            record.endpoint.into(),
            record.method.as_str().into(),
            i32::from(record.status_code).into(),
            i64::try_from(record.response_time_ms)
                .unwrap_or(i64::MAX)
                .into(),
            record.environment.into(),
            record.project_name.into(),
            record.error.into(),
        ])
        .context("invalid call log row")?;

        let backend = self.db.get_database_backend();
        self.db.execute(backend.build(&stmt)).await?;
        Ok(())
    }

    async fn get(&self, request_id: Uuid) -> anyhow::Result<Option<CallLogRecord>> {
        let stmt = Query::select()
            .columns(CALL_LOG_COLUMNS.map(Alias::new))
            .from(Alias::new(self.call_logs_table.as_str()))
            .and_where(Expr::col(Alias::new("request_id")).eq(request_id.to_string()))
            .to_owned();

        let backend = self.db.get_database_backend();
        self.db
            .query_one(backend.build(&stmt))
            .await?
            .as_ref()
            .map(call_log_from_row)
            .transpose()
    }
}
