//! # Ticket Lifecycle Management
//!
//! This module is the single authority on ticket status transitions. Every
//! status change in the system is expressed as a [`TicketAction`], checked
//! against the transition table, and turned into a [`TicketPatch`] that the
//! store applies atomically. Nothing else mutates `status` or the lifecycle
//! timestamps.
//!
//! ## Transition Table
//!
//! | From              | Action          | To        | Side effects                                   |
//! |-------------------|-----------------|-----------|------------------------------------------------|
//! | waiting           | call(staff)     | called    | staff assigned, `called_at` set                |
//! | called            | recall          | called    | `called_at` re-set, staff kept or reassigned   |
//! | waiting, called   | start serving   | serving   | `served_at` set                                |
//! | called, serving   | complete        | completed | `completed_at` set                             |
//! | any non-terminal  | no-show         | no-show   | `completed_at` set                             |
//! | any non-terminal  | cancel          | cancelled | `completed_at` set                             |
//! | waiting           | transfer(svc)   | waiting   | service replaced, staff and call markers reset |
//!
//! Terminal states (`completed`, `no-show`, `cancelled`) admit no actions.
//! An action outside the table fails with
//! [`TicketingError::InvalidTransition`] and leaves the ticket untouched.
//!
//! ## Examples
//!
//! ```
//! use queuehub_ticket_engine::lifecycle::{self, TicketAction};
//! use queuehub_ticket_engine::types::TicketStatus;
//!
//! let call = TicketAction::Call { staff_id: "staff-001".to_string() };
//! assert!(lifecycle::is_action_allowed(TicketStatus::Waiting, &call));
//! assert!(!lifecycle::is_action_allowed(TicketStatus::Serving, &call));
//!
//! // Re-announcing keeps the ticket's place: called -> called is legal
//! let recall = TicketAction::Recall { staff_id: None };
//! assert!(lifecycle::is_action_allowed(TicketStatus::Called, &recall));
//!
//! // Terminal states reject everything
//! assert!(!lifecycle::is_action_allowed(TicketStatus::Completed, &TicketAction::Complete));
//! ```

use chrono::{DateTime, Utc};

use crate::error::{Result, TicketingError};
use crate::types::{Ticket, TicketPatch, TicketStatus};

/// An action that drives a ticket through its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketAction {
    /// Staff calls the ticket to their counter
    Call { staff_id: String },
    /// Re-announce a called ticket; `Some` reassigns it to another staff member
    Recall { staff_id: Option<String> },
    /// Service begins at the counter
    StartServing,
    /// Service finished successfully
    Complete,
    /// Customer never showed up after being called
    NoShow,
    /// Ticket withdrawn by the customer or staff
    Cancel,
    /// Move a waiting ticket to another service queue (re-enters at the back)
    Transfer { service_id: String },
}

impl TicketAction {
    /// Short name used in logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            TicketAction::Call { .. } => "call",
            TicketAction::Recall { .. } => "recall",
            TicketAction::StartServing => "start-serving",
            TicketAction::Complete => "complete",
            TicketAction::NoShow => "no-show",
            TicketAction::Cancel => "cancel",
            TicketAction::Transfer { .. } => "transfer",
        }
    }
}

impl std::fmt::Display for TicketAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Statuses from which `action` is legal
///
/// The returned slice doubles as the guard set for conditional store
/// updates: an update only commits when the ticket is still in one of
/// these statuses at write time.
pub fn allowed_sources(action: &TicketAction) -> &'static [TicketStatus] {
    use TicketStatus::*;

    match action {
        TicketAction::Call { .. } => &[Waiting],
        TicketAction::Recall { .. } => &[Called],
        TicketAction::StartServing => &[Waiting, Called],
        TicketAction::Complete => &[Called, Serving],
        TicketAction::NoShow => &[Waiting, Called, Serving],
        TicketAction::Cancel => &[Waiting, Called, Serving],
        TicketAction::Transfer { .. } => &[Waiting],
    }
}

/// Check whether `action` is legal from `from`
pub fn is_action_allowed(from: TicketStatus, action: &TicketAction) -> bool {
    allowed_sources(action).contains(&from)
}

/// Status the ticket lands in after `action`
pub fn target_status(action: &TicketAction) -> TicketStatus {
    match action {
        TicketAction::Call { .. } => TicketStatus::Called,
        TicketAction::Recall { .. } => TicketStatus::Called,
        TicketAction::StartServing => TicketStatus::Serving,
        TicketAction::Complete => TicketStatus::Completed,
        TicketAction::NoShow => TicketStatus::NoShow,
        TicketAction::Cancel => TicketStatus::Cancelled,
        TicketAction::Transfer { .. } => TicketStatus::Waiting,
    }
}

/// Validate `action` against the ticket's current status and build the
/// patch that performs it
///
/// The patch carries the target status plus the table's side effects,
/// timestamped with `now`. Fails with
/// [`TicketingError::InvalidTransition`] when the action is illegal;
/// nothing is mutated in that case.
pub fn transition_patch(
    ticket: &Ticket,
    action: &TicketAction,
    now: DateTime<Utc>,
) -> Result<TicketPatch> {
    if !is_action_allowed(ticket.status, action) {
        return Err(TicketingError::invalid_transition(format!(
            "Cannot {} ticket {} in status '{}'",
            action, ticket.number, ticket.status
        )));
    }

    let mut patch = TicketPatch {
        status: Some(target_status(action)),
        ..Default::default()
    };

    match action {
        TicketAction::Call { staff_id } => {
            patch.staff_id = Some(Some(staff_id.clone()));
            patch.called_at = Some(Some(now));
        }
        TicketAction::Recall { staff_id } => {
            patch.called_at = Some(Some(now));
            if let Some(staff_id) = staff_id {
                patch.staff_id = Some(Some(staff_id.clone()));
            }
        }
        TicketAction::StartServing => {
            patch.served_at = Some(Some(now));
        }
        TicketAction::Complete | TicketAction::NoShow | TicketAction::Cancel => {
            patch.completed_at = Some(Some(now));
        }
        TicketAction::Transfer { service_id } => {
            patch.service_id = Some(service_id.clone());
            patch.staff_id = Some(None);
            patch.called_at = Some(None);
            patch.served_at = Some(None);
        }
    }

    Ok(patch)
}
