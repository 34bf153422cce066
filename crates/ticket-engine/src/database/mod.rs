//! # Ticket Persistence (repository abstraction)
//!
//! The engine talks to storage exclusively through [`TicketRepository`].
//! Two backends implement it:
//!
//! - [`SqliteTicketStore`](sqlite::SqliteTicketStore): sqlx + SQLite (WAL),
//!   the production store
//! - [`MemoryTicketStore`](memory::MemoryTicketStore): dashmap-based,
//!   for tests and embedded use
//!
//! Both provide the same atomicity guarantees: the daily counter increment
//! is atomic per `(day, prefix)`, and guarded updates commit only when the
//! ticket is still in one of the expected statuses, so racing transitions
//! cannot overwrite each other.
//!
//! ## Quick Start
//!
//! ```rust
//! use queuehub_ticket_engine::database::{TicketRepository, sqlite::SqliteTicketStore};
//!
//! # async fn example() -> queuehub_ticket_engine::Result<()> {
//! // In-memory SQLite for tests; file-backed in production
//! let store = SqliteTicketStore::new_in_memory(0).await?;
//! let today = chrono::Utc::now().date_naive();
//!
//! let first = store.next_sequence(today, 'A').await?;
//! assert_eq!(first, 1);
//! # Ok(())
//! # }
//! ```

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::Row;

use crate::error::{Result, TicketingError};
use crate::types::{Ticket, TicketFilter, TicketPatch, TicketStatus};

pub use memory::MemoryTicketStore;
pub use sqlite::SqliteTicketStore;

/// Storage contract for tickets and daily counters
///
/// Implementations must make every mutation visible to all readers before
/// returning, and must serialize updates per ticket id.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Persist a freshly created ticket
    async fn insert_ticket(&self, ticket: &Ticket) -> Result<()>;

    /// Fetch a ticket by id
    async fn get_ticket(&self, id: &str) -> Result<Option<Ticket>>;

    /// Fetch the most recently created ticket with this number
    ///
    /// Numbers repeat across day partitions; the newest match wins.
    async fn get_ticket_by_number(&self, number: &str) -> Result<Option<Ticket>>;

    /// List tickets matching the AND-combined filter, oldest first
    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>>;

    /// Merge a patch into a ticket unconditionally
    async fn update_ticket(&self, id: &str, patch: &TicketPatch) -> Result<Ticket>;

    /// Merge a patch only while the ticket is still in one of `expected`
    ///
    /// Fails with [`TicketingError::Conflict`] when a competing update
    /// moved the ticket out of the expected statuses first; the losing
    /// patch is not applied.
    async fn update_ticket_guarded(
        &self,
        id: &str,
        expected: &[TicketStatus],
        patch: &TicketPatch,
    ) -> Result<Ticket>;

    /// Remove a ticket; returns whether it existed
    async fn delete_ticket(&self, id: &str) -> Result<bool>;

    /// Atomically increment and return the `(day, prefix)` counter
    ///
    /// Starts at 1 for a fresh partition and never repeats a value for
    /// concurrent callers.
    async fn next_sequence(&self, day: NaiveDate, prefix: char) -> Result<i64>;
}

/// Map a `tickets` row to the domain type
pub(crate) fn ticket_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Ticket> {
    let status_raw: String = row
        .try_get("status")
        .map_err(|e| TicketingError::database(format!("Failed to read ticket row: {}", e)))?;
    let status: TicketStatus = status_raw.parse()?;

    let read = |e: sqlx::Error| TicketingError::database(format!("Failed to read ticket row: {}", e));

    Ok(Ticket {
        id: row.try_get("id").map_err(read)?,
        number: row.try_get("number").map_err(read)?,
        branch_id: row.try_get("branch_id").map_err(read)?,
        service_id: row.try_get("service_id").map_err(read)?,
        staff_id: row.try_get("staff_id").map_err(read)?,
        status,
        priority: row.try_get("priority").map_err(read)?,
        created_at: row.try_get("created_at").map_err(read)?,
        called_at: row.try_get("called_at").map_err(read)?,
        served_at: row.try_get("served_at").map_err(read)?,
        completed_at: row.try_get("completed_at").map_err(read)?,
        estimated_wait_time: row.try_get("estimated_wait_time").map_err(read)?,
        notes: row.try_get("notes").map_err(read)?,
    })
}
