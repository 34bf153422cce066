//! SQLite ticket store (sqlx, WAL mode)
//!
//! Runtime-checked queries over a pooled connection. The schema is ensured
//! at connect time; counter increments use a single atomic upsert and
//! transition updates guard on the prior status via affected-row counts.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::error::{Result, TicketingError};
use crate::numbering;
use crate::types::{Ticket, TicketFilter, TicketPatch, TicketStatus};

use super::{ticket_from_row, TicketRepository};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tickets (
    id TEXT PRIMARY KEY,
    number TEXT NOT NULL,
    branch_id TEXT NOT NULL,
    service_id TEXT NOT NULL,
    staff_id TEXT,
    status TEXT NOT NULL,
    priority INTEGER NOT NULL DEFAULT 1,
    day TEXT NOT NULL,
    created_at TEXT NOT NULL,
    called_at TEXT,
    served_at TEXT,
    completed_at TEXT,
    estimated_wait_time INTEGER NOT NULL DEFAULT 0,
    notes TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_tickets_queue ON tickets (branch_id, service_id, status);
CREATE INDEX IF NOT EXISTS idx_tickets_created_at ON tickets (created_at);

CREATE TABLE IF NOT EXISTS ticket_counters (
    day TEXT NOT NULL,
    prefix TEXT NOT NULL,
    last_sequence INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (day, prefix)
);
"#;

const TICKET_COLUMNS: &str = "id, number, branch_id, service_id, staff_id, status, priority, \
     created_at, called_at, served_at, completed_at, estimated_wait_time, notes";

/// sqlx-backed ticket store
#[derive(Clone)]
pub struct SqliteTicketStore {
    pool: SqlitePool,
    timezone_offset_minutes: i32,
}

impl SqliteTicketStore {
    /// Open (creating if missing) a SQLite database and ensure the schema
    ///
    /// `timezone_offset_minutes` pins the service clock used for the `day`
    /// partition of tickets and counters.
    pub async fn new(database_url: &str, timezone_offset_minutes: i32) -> Result<Self> {
        info!("🗄️ Initializing ticket store: {}", database_url);

        // Configure connection options for production performance
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| TicketingError::database(format!("Invalid database URL: {}", e)))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        // An in-memory database exists per connection; keep the pool at one
        // so every query sees the same data.
        let mut pool_options = SqlitePoolOptions::new();
        if database_url.contains(":memory:") {
            pool_options = pool_options.max_connections(1);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| TicketingError::database(format!("Failed to connect to database: {}", e)))?;

        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| TicketingError::database(format!("Failed to ensure schema: {}", e)))?;

        info!("✅ Ticket store initialized (WAL mode enabled)");
        Ok(Self {
            pool,
            timezone_offset_minutes,
        })
    }

    /// Create an in-memory store for testing
    pub async fn new_in_memory(timezone_offset_minutes: i32) -> Result<Self> {
        Self::new("sqlite::memory:", timezone_offset_minutes).await
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn day_of(&self, ticket: &Ticket) -> String {
        numbering::day_key(ticket.created_at, self.timezone_offset_minutes).to_string()
    }
}

/// SET clauses for the patched columns, in bind order
fn patch_set_clauses(patch: &TicketPatch) -> Vec<&'static str> {
    let mut clauses = Vec::new();
    if patch.status.is_some() {
        clauses.push("status = ?");
    }
    if patch.staff_id.is_some() {
        clauses.push("staff_id = ?");
    }
    if patch.service_id.is_some() {
        clauses.push("service_id = ?");
    }
    if patch.priority.is_some() {
        clauses.push("priority = ?");
    }
    if patch.called_at.is_some() {
        clauses.push("called_at = ?");
    }
    if patch.served_at.is_some() {
        clauses.push("served_at = ?");
    }
    if patch.completed_at.is_some() {
        clauses.push("completed_at = ?");
    }
    if patch.estimated_wait_time.is_some() {
        clauses.push("estimated_wait_time = ?");
    }
    if patch.notes.is_some() {
        clauses.push("notes = ?");
    }
    clauses
}

/// Bind patched values in the same order `patch_set_clauses` emits them
fn bind_patch<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    patch: &TicketPatch,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    if let Some(status) = patch.status {
        query = query.bind(status.as_str());
    }
    if let Some(staff_id) = &patch.staff_id {
        query = query.bind(staff_id.clone());
    }
    if let Some(service_id) = &patch.service_id {
        query = query.bind(service_id.clone());
    }
    if let Some(priority) = patch.priority {
        query = query.bind(priority);
    }
    if let Some(called_at) = patch.called_at {
        query = query.bind(called_at);
    }
    if let Some(served_at) = patch.served_at {
        query = query.bind(served_at);
    }
    if let Some(completed_at) = patch.completed_at {
        query = query.bind(completed_at);
    }
    if let Some(estimated_wait_time) = patch.estimated_wait_time {
        query = query.bind(estimated_wait_time);
    }
    if let Some(notes) = &patch.notes {
        query = query.bind(notes.clone());
    }
    query
}

#[async_trait]
impl TicketRepository for SqliteTicketStore {
    async fn insert_ticket(&self, ticket: &Ticket) -> Result<()> {
        sqlx::query(
            "INSERT INTO tickets (id, number, branch_id, service_id, staff_id, status, priority, \
             day, created_at, called_at, served_at, completed_at, estimated_wait_time, notes) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&ticket.id)
        .bind(&ticket.number)
        .bind(&ticket.branch_id)
        .bind(&ticket.service_id)
        .bind(&ticket.staff_id)
        .bind(ticket.status.as_str())
        .bind(ticket.priority)
        .bind(self.day_of(ticket))
        .bind(ticket.created_at)
        .bind(ticket.called_at)
        .bind(ticket.served_at)
        .bind(ticket.completed_at)
        .bind(ticket.estimated_wait_time)
        .bind(&ticket.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| TicketingError::database(format!("Failed to insert ticket: {}", e)))?;

        debug!("🗄️ Inserted ticket {} ({})", ticket.number, ticket.id);
        Ok(())
    }

    async fn get_ticket(&self, id: &str) -> Result<Option<Ticket>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tickets WHERE id = ?",
            TICKET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TicketingError::database(format!("Failed to fetch ticket: {}", e)))?;

        row.as_ref().map(ticket_from_row).transpose()
    }

    async fn get_ticket_by_number(&self, number: &str) -> Result<Option<Ticket>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tickets WHERE number = ? ORDER BY created_at DESC LIMIT 1",
            TICKET_COLUMNS
        ))
        .bind(number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TicketingError::database(format!("Failed to fetch ticket by number: {}", e)))?;

        row.as_ref().map(ticket_from_row).transpose()
    }

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        // Base query with proper parameterization
        let mut query_str = format!("SELECT {} FROM tickets WHERE 1=1", TICKET_COLUMNS);
        let mut params: Vec<String> = Vec::new();

        if let Some(branch_id) = &filter.branch_id {
            query_str.push_str(" AND branch_id = ?");
            params.push(branch_id.clone());
        }
        if let Some(service_id) = &filter.service_id {
            query_str.push_str(" AND service_id = ?");
            params.push(service_id.clone());
        }
        if let Some(staff_id) = &filter.staff_id {
            query_str.push_str(" AND staff_id = ?");
            params.push(staff_id.clone());
        }
        if let Some(status) = filter.status {
            query_str.push_str(" AND status = ?");
            params.push(status.as_str().to_string());
        }
        if let Some(date) = filter.date {
            query_str.push_str(" AND day = ?");
            params.push(date.to_string());
        }

        query_str.push_str(" ORDER BY created_at ASC");

        let mut query = sqlx::query(&query_str);
        for param in &params {
            query = query.bind(param);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| TicketingError::database(format!("Failed to list tickets: {}", e)))?;

        rows.iter().map(ticket_from_row).collect()
    }

    async fn update_ticket(&self, id: &str, patch: &TicketPatch) -> Result<Ticket> {
        let clauses = patch_set_clauses(patch);
        if clauses.is_empty() {
            return self
                .get_ticket(id)
                .await?
                .ok_or_else(|| TicketingError::not_found(format!("Ticket '{}' not found", id)));
        }

        let sql = format!("UPDATE tickets SET {} WHERE id = ?", clauses.join(", "));
        let result = bind_patch(sqlx::query(&sql), patch)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| TicketingError::database(format!("Failed to update ticket: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(TicketingError::not_found(format!(
                "Ticket '{}' not found",
                id
            )));
        }

        self.get_ticket(id)
            .await?
            .ok_or_else(|| TicketingError::not_found(format!("Ticket '{}' not found", id)))
    }

    async fn update_ticket_guarded(
        &self,
        id: &str,
        expected: &[TicketStatus],
        patch: &TicketPatch,
    ) -> Result<Ticket> {
        let clauses = patch_set_clauses(patch);
        if clauses.is_empty() {
            return self
                .get_ticket(id)
                .await?
                .ok_or_else(|| TicketingError::not_found(format!("Ticket '{}' not found", id)));
        }

        let placeholders = vec!["?"; expected.len()].join(", ");
        let sql = format!(
            "UPDATE tickets SET {} WHERE id = ? AND status IN ({})",
            clauses.join(", "),
            placeholders
        );

        let mut query = bind_patch(sqlx::query(&sql), patch).bind(id);
        for status in expected {
            query = query.bind(status.as_str());
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| TicketingError::database(format!("Failed to update ticket: {}", e)))?;

        if result.rows_affected() == 0 {
            // Figure out whether the ticket is gone or just moved on
            let current = sqlx::query("SELECT status FROM tickets WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| TicketingError::database(format!("Failed to fetch ticket: {}", e)))?;

            return match current {
                None => Err(TicketingError::not_found(format!(
                    "Ticket '{}' not found",
                    id
                ))),
                Some(row) => {
                    let status: String = row.try_get("status").map_err(|e| {
                        TicketingError::database(format!("Failed to read ticket row: {}", e))
                    })?;
                    debug!("⚠️ Guarded update lost the race for ticket {} (now '{}')", id, status);
                    Err(TicketingError::conflict(format!(
                        "Ticket '{}' is '{}' now; another update won the race",
                        id, status
                    )))
                }
            };
        }

        self.get_ticket(id)
            .await?
            .ok_or_else(|| TicketingError::not_found(format!("Ticket '{}' not found", id)))
    }

    async fn delete_ticket(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| TicketingError::database(format!("Failed to delete ticket: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn next_sequence(&self, day: NaiveDate, prefix: char) -> Result<i64> {
        // Single atomic upsert; concurrent callers never see the same value
        let row = sqlx::query(
            "INSERT INTO ticket_counters (day, prefix, last_sequence) VALUES (?, ?, 1) \
             ON CONFLICT(day, prefix) DO UPDATE SET last_sequence = last_sequence + 1 \
             RETURNING last_sequence",
        )
        .bind(day.to_string())
        .bind(prefix.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| TicketingError::database(format!("Failed to increment counter: {}", e)))?;

        let sequence: i64 = row
            .try_get("last_sequence")
            .map_err(|e| TicketingError::database(format!("Failed to read counter: {}", e)))?;

        debug!("🔢 Counter {}/{} -> {}", day, prefix, sequence);
        Ok(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn sample_ticket(number: &str, branch: &str, service: &str) -> Ticket {
        Ticket {
            id: Ticket::new_id(),
            number: number.to_string(),
            branch_id: branch.to_string(),
            service_id: service.to_string(),
            staff_id: None,
            status: TicketStatus::Waiting,
            priority: 1,
            created_at: Utc::now(),
            called_at: None,
            served_at: None,
            completed_at: None,
            estimated_wait_time: 0,
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let store = SqliteTicketStore::new_in_memory(0).await.unwrap();
        let ticket = sample_ticket("A-001", "branch-1", "service-1");

        store.insert_ticket(&ticket).await.unwrap();
        let fetched = store.get_ticket(&ticket.id).await.unwrap().unwrap();

        assert_eq!(fetched.id, ticket.id);
        assert_eq!(fetched.number, "A-001");
        assert_eq!(fetched.status, TicketStatus::Waiting);
        assert_eq!(fetched.priority, 1);
        assert!(fetched.staff_id.is_none());
        assert!(fetched.called_at.is_none());
    }

    #[tokio::test]
    async fn get_by_number_returns_most_recent() {
        let store = SqliteTicketStore::new_in_memory(0).await.unwrap();

        let mut old = sample_ticket("A-001", "branch-1", "service-1");
        old.created_at = Utc::now() - Duration::days(1);
        let new = sample_ticket("A-001", "branch-1", "service-1");

        store.insert_ticket(&old).await.unwrap();
        store.insert_ticket(&new).await.unwrap();

        let fetched = store.get_ticket_by_number("A-001").await.unwrap().unwrap();
        assert_eq!(fetched.id, new.id);
    }

    #[tokio::test]
    async fn counter_is_monotonic_per_partition() {
        let store = SqliteTicketStore::new_in_memory(0).await.unwrap();
        let today = Utc::now().date_naive();

        assert_eq!(store.next_sequence(today, 'A').await.unwrap(), 1);
        assert_eq!(store.next_sequence(today, 'A').await.unwrap(), 2);
        assert_eq!(store.next_sequence(today, 'A').await.unwrap(), 3);

        // Other partitions are independent
        assert_eq!(store.next_sequence(today, 'B').await.unwrap(), 1);
        let tomorrow = today + Duration::days(1);
        assert_eq!(store.next_sequence(tomorrow, 'A').await.unwrap(), 1);
    }

    #[tokio::test]
    async fn guarded_update_commits_only_from_expected_status() {
        let store = SqliteTicketStore::new_in_memory(0).await.unwrap();
        let ticket = sample_ticket("A-002", "branch-1", "service-1");
        store.insert_ticket(&ticket).await.unwrap();

        let call_patch = TicketPatch {
            status: Some(TicketStatus::Called),
            staff_id: Some(Some("staff-1".to_string())),
            called_at: Some(Some(Utc::now())),
            ..Default::default()
        };

        let updated = store
            .update_ticket_guarded(&ticket.id, &[TicketStatus::Waiting], &call_patch)
            .await
            .unwrap();
        assert_eq!(updated.status, TicketStatus::Called);
        assert_eq!(updated.staff_id, Some("staff-1".to_string()));

        // Second call on the same guard loses the race
        let err = store
            .update_ticket_guarded(&ticket.id, &[TicketStatus::Waiting], &call_patch)
            .await
            .unwrap_err();
        assert!(matches!(err, TicketingError::Conflict(_)));

        // The stored ticket is unchanged by the loser
        let current = store.get_ticket(&ticket.id).await.unwrap().unwrap();
        assert_eq!(current.status, TicketStatus::Called);
    }

    #[tokio::test]
    async fn guarded_update_on_missing_ticket_is_not_found() {
        let store = SqliteTicketStore::new_in_memory(0).await.unwrap();
        let patch = TicketPatch {
            status: Some(TicketStatus::Called),
            ..Default::default()
        };
        let err = store
            .update_ticket_guarded("missing", &[TicketStatus::Waiting], &patch)
            .await
            .unwrap_err();
        assert!(matches!(err, TicketingError::NotFound(_)));
    }

    #[tokio::test]
    async fn patch_can_clear_nullable_columns() {
        let store = SqliteTicketStore::new_in_memory(0).await.unwrap();
        let mut ticket = sample_ticket("A-003", "branch-1", "service-1");
        ticket.status = TicketStatus::Called;
        ticket.staff_id = Some("staff-1".to_string());
        ticket.called_at = Some(Utc::now());
        store.insert_ticket(&ticket).await.unwrap();

        let transfer_patch = TicketPatch {
            status: Some(TicketStatus::Waiting),
            service_id: Some("service-2".to_string()),
            staff_id: Some(None),
            called_at: Some(None),
            served_at: Some(None),
            ..Default::default()
        };

        let updated = store.update_ticket(&ticket.id, &transfer_patch).await.unwrap();
        assert_eq!(updated.status, TicketStatus::Waiting);
        assert_eq!(updated.service_id, "service-2");
        assert!(updated.staff_id.is_none());
        assert!(updated.called_at.is_none());
    }

    #[tokio::test]
    async fn filters_are_and_combined() {
        let store = SqliteTicketStore::new_in_memory(0).await.unwrap();

        let a = sample_ticket("A-001", "branch-1", "service-1");
        let mut b = sample_ticket("A-002", "branch-1", "service-2");
        b.status = TicketStatus::Completed;
        let c = sample_ticket("B-001", "branch-2", "service-3");

        for ticket in [&a, &b, &c] {
            store.insert_ticket(ticket).await.unwrap();
        }

        let branch_only = store
            .list_tickets(&TicketFilter {
                branch_id: Some("branch-1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(branch_only.len(), 2);

        let branch_and_status = store
            .list_tickets(&TicketFilter {
                branch_id: Some("branch-1".to_string()),
                status: Some(TicketStatus::Completed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(branch_and_status.len(), 1);
        assert_eq!(branch_and_status[0].number, "A-002");

        let today = store
            .list_tickets(&TicketFilter {
                date: Some(Utc::now().date_naive()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(today.len(), 3);

        let yesterday = store
            .list_tickets(&TicketFilter {
                date: Some(Utc::now().date_naive() - Duration::days(1)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(yesterday.is_empty());
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let store = SqliteTicketStore::new_in_memory(0).await.unwrap();
        let ticket = sample_ticket("A-004", "branch-1", "service-1");
        store.insert_ticket(&ticket).await.unwrap();

        assert!(store.delete_ticket(&ticket.id).await.unwrap());
        assert!(!store.delete_ticket(&ticket.id).await.unwrap());
        assert!(store.get_ticket(&ticket.id).await.unwrap().is_none());
    }
}
