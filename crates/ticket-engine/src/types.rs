//! Core ticket types shared across the engine

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, TicketingError};

/// Lifecycle states of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    Waiting,
    Called,
    Serving,
    Completed,
    NoShow,
    Cancelled,
}

impl TicketStatus {
    /// Wire/storage representation (`no-show` for [`TicketStatus::NoShow`])
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Waiting => "waiting",
            TicketStatus::Called => "called",
            TicketStatus::Serving => "serving",
            TicketStatus::Completed => "completed",
            TicketStatus::NoShow => "no-show",
            TicketStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TicketStatus::Completed | TicketStatus::NoShow | TicketStatus::Cancelled
        )
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = TicketingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "waiting" => Ok(TicketStatus::Waiting),
            "called" => Ok(TicketStatus::Called),
            "serving" => Ok(TicketStatus::Serving),
            "completed" => Ok(TicketStatus::Completed),
            "no-show" => Ok(TicketStatus::NoShow),
            "cancelled" => Ok(TicketStatus::Cancelled),
            other => Err(TicketingError::validation(format!(
                "Unknown ticket status '{}'",
                other
            ))),
        }
    }
}

/// A single customer's queue entry for one service visit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    /// Human-facing label, e.g. `A-007`
    pub number: String,
    pub branch_id: String,
    pub service_id: String,
    /// Set when the ticket is called
    pub staff_id: Option<String>,
    pub status: TicketStatus,
    /// Higher value is serviced first; minimum 1
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub called_at: Option<DateTime<Utc>>,
    pub served_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Minutes, computed at creation; a hint, not authoritative
    pub estimated_wait_time: i64,
    pub notes: String,
}

impl Ticket {
    /// Create a new ticket ID
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }
}

/// Request to issue a new ticket
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub branch_id: String,
    pub service_id: String,
    pub priority: Option<i32>,
    pub notes: Option<String>,
}

/// Filter for listing tickets; conditions are AND-combined
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketFilter {
    pub branch_id: Option<String>,
    pub service_id: Option<String>,
    pub staff_id: Option<String>,
    pub status: Option<TicketStatus>,
    /// Matches the calendar day of `created_at` in the pinned service timezone
    pub date: Option<NaiveDate>,
}

impl TicketFilter {
    /// Filter down to the waiting cohort of one (branch, service) pair
    pub fn waiting_cohort(branch_id: &str, service_id: &str) -> Self {
        Self {
            branch_id: Some(branch_id.to_string()),
            service_id: Some(service_id.to_string()),
            status: Some(TicketStatus::Waiting),
            ..Default::default()
        }
    }
}

/// Partial update merged into a stored ticket
///
/// Outer `None` leaves a field unchanged; for nullable fields the inner
/// `Option` distinguishes "set" from "clear".
#[derive(Debug, Clone, Default)]
pub struct TicketPatch {
    pub status: Option<TicketStatus>,
    pub staff_id: Option<Option<String>>,
    pub service_id: Option<String>,
    pub priority: Option<i32>,
    pub called_at: Option<Option<DateTime<Utc>>>,
    pub served_at: Option<Option<DateTime<Utc>>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub estimated_wait_time: Option<i64>,
    pub notes: Option<String>,
}

impl TicketPatch {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.staff_id.is_none()
            && self.service_id.is_none()
            && self.priority.is_none()
            && self.called_at.is_none()
            && self.served_at.is_none()
            && self.completed_at.is_none()
            && self.estimated_wait_time.is_none()
            && self.notes.is_none()
    }

    /// Merge this patch into `ticket` in place
    pub fn apply(&self, ticket: &mut Ticket) {
        if let Some(status) = self.status {
            ticket.status = status;
        }
        if let Some(staff_id) = &self.staff_id {
            ticket.staff_id = staff_id.clone();
        }
        if let Some(service_id) = &self.service_id {
            ticket.service_id = service_id.clone();
        }
        if let Some(priority) = self.priority {
            ticket.priority = priority;
        }
        if let Some(called_at) = self.called_at {
            ticket.called_at = called_at;
        }
        if let Some(served_at) = self.served_at {
            ticket.served_at = served_at;
        }
        if let Some(completed_at) = self.completed_at {
            ticket.completed_at = completed_at;
        }
        if let Some(estimated_wait_time) = self.estimated_wait_time {
            ticket.estimated_wait_time = estimated_wait_time;
        }
        if let Some(notes) = &self.notes {
            ticket.notes = notes.clone();
        }
    }
}
