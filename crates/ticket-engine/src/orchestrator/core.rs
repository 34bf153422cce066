//! # TicketingEngine - the operational core
//!
//! One struct owns the moving parts: the configuration, the ticket
//! repository, the directory registry, and the event bus. Every operation
//! the APIs expose runs through here, so the atomicity rules live in one
//! place:
//!
//! - ticket numbers come from the repository's atomic per-(day, prefix)
//!   counter, never from engine state;
//! - every lifecycle transition is a guarded update that only commits
//!   while the ticket is still in a legal source status, so racing
//!   transitions lose cleanly instead of overwriting each other;
//! - ordering and position are computed from a fresh cohort snapshot on
//!   every call, never cached.
//!
//! ## Examples
//!
//! ```rust
//! use queuehub_ticket_engine::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let engine = TicketingEngine::new(TicketingConfig::default()).await?;
//!
//! // Seed the directory
//! let org = Organization::new("Metro Bank", OrganizationKind::Bank);
//! let org_id = org.id.clone();
//! engine.directory().register_organization(org);
//! let branch = Branch::new(org_id, "Downtown".to_string());
//! engine.directory().register_branch(branch.clone())?;
//! let service = Service::new(branch.id.clone(), "Deposits".to_string(), 15);
//! engine.directory().register_service(service.clone())?;
//!
//! // Issue and call a ticket
//! let ticket = engine
//!     .create_ticket(CreateTicketRequest {
//!         branch_id: branch.id.clone(),
//!         service_id: service.id.clone(),
//!         priority: None,
//!         notes: None,
//!     })
//!     .await?;
//! assert_eq!(ticket.number, "A-001");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::TicketingConfig;
use crate::database::{MemoryTicketStore, SqliteTicketStore, TicketRepository};
use crate::directory::Directory;
use crate::error::{Result, TicketingError};
use crate::lifecycle::{self, TicketAction};
use crate::monitoring::{TicketEventBus, TicketEventKind};
use crate::numbering::{self, DEFAULT_PREFIX};
use crate::queue::{ordering, position, stats, QueuePosition, QueueStatistics, StaffPerformance};
use crate::types::{CreateTicketRequest, Ticket, TicketFilter, TicketPatch, TicketStatus};

/// Attempts before a repeatedly-conflicting `call_next` gives up
const MAX_CALL_ATTEMPTS: usize = 3;

/// A serving ticket enriched for wall displays
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServingTicket {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub staff_name: Option<String>,
    pub counter: Option<String>,
    pub service_name: Option<String>,
}

/// The queue-ticketing engine
///
/// Cheap to share: wrap it in an [`Arc`] and clone the handle.
pub struct TicketingEngine {
    config: TicketingConfig,
    repository: Arc<dyn TicketRepository>,
    directory: Arc<Directory>,
    events: TicketEventBus,
}

impl TicketingEngine {
    /// Create an engine from configuration
    ///
    /// `general.database_path` selects the SQLite store; `None` runs on
    /// the in-memory store.
    pub async fn new(config: TicketingConfig) -> Result<Arc<Self>> {
        config.validate()?;
        let tz = config.general.timezone_offset_minutes;

        let repository: Arc<dyn TicketRepository> = match &config.general.database_path {
            Some(path) => Arc::new(SqliteTicketStore::new(&format!("sqlite://{}", path), tz).await?),
            None => Arc::new(MemoryTicketStore::new(tz)),
        };

        Ok(Self::with_repository(config, repository))
    }

    /// Create an engine over an injected repository
    ///
    /// The repository is trusted to honor the configured service clock
    /// for its day-scoped queries.
    pub fn with_repository(
        config: TicketingConfig,
        repository: Arc<dyn TicketRepository>,
    ) -> Arc<Self> {
        let events = TicketEventBus::new(config.queue.event_history_limit);
        info!("🎫 Ticketing engine ready (service clock UTC{:+} min)", config.general.timezone_offset_minutes);
        Arc::new(Self {
            config,
            repository,
            directory: Arc::new(Directory::new()),
            events,
        })
    }

    /// Engine configuration
    pub fn config(&self) -> &TicketingConfig {
        &self.config
    }

    /// The organization/branch/service/staff registry
    pub fn directory(&self) -> &Arc<Directory> {
        &self.directory
    }

    /// The change-event bus
    pub fn events(&self) -> &TicketEventBus {
        &self.events
    }

    /// The underlying ticket repository
    pub fn repository(&self) -> &Arc<dyn TicketRepository> {
        &self.repository
    }

    /// Today under the pinned service clock
    pub fn today(&self) -> NaiveDate {
        numbering::day_key(Utc::now(), self.config.general.timezone_offset_minutes)
    }

    /// Minutes one visit to `service_id` is expected to take
    fn service_minutes(&self, service_id: &str) -> i64 {
        self.directory
            .service_duration(service_id)
            .unwrap_or(self.config.queue.default_service_minutes)
    }

    // ========================================================================
    // Ticket creation and retrieval
    // ========================================================================

    /// Issue a new ticket
    ///
    /// Validates the branch and service against the directory, draws the
    /// next daily sequence for the branch's category prefix, and computes
    /// the initial wait estimate from the current queue depth. Nothing is
    /// persisted when validation fails.
    pub async fn create_ticket(&self, request: CreateTicketRequest) -> Result<Ticket> {
        let branch = self.directory.get_branch(&request.branch_id).ok_or_else(|| {
            TicketingError::validation(format!("Branch '{}' does not exist", request.branch_id))
        })?;
        let service = self
            .directory
            .get_service(&request.service_id)
            .ok_or_else(|| {
                TicketingError::validation(format!(
                    "Service '{}' does not exist",
                    request.service_id
                ))
            })?;

        let priority = request.priority.unwrap_or(self.config.queue.default_priority);
        if priority < 1 {
            return Err(TicketingError::validation(format!(
                "Priority must be at least 1, got {}",
                priority
            )));
        }

        let prefix = self
            .directory
            .organization_kind_for_branch(&branch.id)
            .map(|kind| kind.category_prefix())
            .unwrap_or(DEFAULT_PREFIX);

        let now = Utc::now();
        let day = numbering::day_key(now, self.config.general.timezone_offset_minutes);
        let sequence = self.repository.next_sequence(day, prefix).await?;
        let number = numbering::format_number(prefix, sequence);

        // Queue depth ahead of this ticket: everyone waiting or already
        // called for the same (branch, service)
        let queued = self
            .repository
            .list_tickets(&TicketFilter {
                branch_id: Some(branch.id.clone()),
                service_id: Some(service.id.clone()),
                ..Default::default()
            })
            .await?;
        let ahead = queued
            .iter()
            .filter(|t| matches!(t.status, TicketStatus::Waiting | TicketStatus::Called))
            .count() as i64;

        let ticket = Ticket {
            id: Ticket::new_id(),
            number: number.clone(),
            branch_id: branch.id,
            service_id: service.id.clone(),
            staff_id: None,
            status: TicketStatus::Waiting,
            priority,
            created_at: now,
            called_at: None,
            served_at: None,
            completed_at: None,
            estimated_wait_time: ahead * self.service_minutes(&service.id),
            notes: request.notes.unwrap_or_default(),
        };

        self.repository.insert_ticket(&ticket).await?;
        info!(
            "🎫 Created ticket {} for service '{}' ({} ahead, est. {} min)",
            number, service.name, ahead, ticket.estimated_wait_time
        );
        self.events
            .publish(TicketEventKind::Created, ticket.clone())
            .await;
        Ok(ticket)
    }

    /// Fetch a ticket by id
    pub async fn get_ticket(&self, id: &str) -> Result<Ticket> {
        self.repository
            .get_ticket(id)
            .await?
            .ok_or_else(|| TicketingError::not_found(format!("Ticket '{}' not found", id)))
    }

    /// Fetch the most recent ticket with this number
    pub async fn get_ticket_by_number(&self, number: &str) -> Result<Ticket> {
        self.repository
            .get_ticket_by_number(number)
            .await?
            .ok_or_else(|| TicketingError::not_found(format!("Ticket '{}' not found", number)))
    }

    /// List tickets matching the filter, oldest first
    pub async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        self.repository.list_tickets(filter).await
    }

    /// Merge a field patch into a ticket
    ///
    /// For staff-owned fields like `notes` and priority adjustments.
    /// Status changes must go through the lifecycle operations; a patch
    /// carrying `status` is rejected here.
    pub async fn update_ticket(&self, id: &str, patch: &TicketPatch) -> Result<Ticket> {
        if patch.status.is_some() {
            return Err(TicketingError::validation(
                "Status changes must use the lifecycle operations".to_string(),
            ));
        }
        let updated = self.repository.update_ticket(id, patch).await?;
        self.events
            .publish(TicketEventKind::Updated, updated.clone())
            .await;
        Ok(updated)
    }

    /// Delete a ticket; returns whether it existed
    pub async fn delete_ticket(&self, id: &str) -> Result<bool> {
        let existing = self.repository.get_ticket(id).await?;
        let deleted = self.repository.delete_ticket(id).await?;
        if deleted {
            if let Some(ticket) = existing {
                self.events.publish(TicketEventKind::Deleted, ticket).await;
            }
        }
        Ok(deleted)
    }

    // ========================================================================
    // Queue ordering and calling
    // ========================================================================

    /// Call the next waiting ticket of a (branch, service) queue
    ///
    /// Returns `Ok(None)` when the queue is empty. Selection is by call
    /// order: highest priority first, then oldest. When another
    /// staff member wins the race for the selected ticket, the call is
    /// retried against a fresh snapshot a bounded number of times.
    pub async fn call_next(
        &self,
        branch_id: &str,
        service_id: &str,
        staff_id: &str,
    ) -> Result<Option<Ticket>> {
        if self.directory.get_staff(staff_id).is_none() {
            return Err(TicketingError::not_found(format!(
                "Staff '{}' not found",
                staff_id
            )));
        }

        for attempt in 1..=MAX_CALL_ATTEMPTS {
            let cohort = self
                .repository
                .list_tickets(&TicketFilter::waiting_cohort(branch_id, service_id))
                .await?;

            let Some(next) = ordering::next_in_line(&cohort) else {
                debug!("📭 No waiting tickets for branch {} service {}", branch_id, service_id);
                return Ok(None);
            };

            let action = TicketAction::Call {
                staff_id: staff_id.to_string(),
            };
            let patch = lifecycle::transition_patch(next, &action, Utc::now())?;

            match self
                .repository
                .update_ticket_guarded(&next.id, lifecycle::allowed_sources(&action), &patch)
                .await
            {
                Ok(called) => {
                    self.directory
                        .set_staff_current_ticket(staff_id, Some(called.id.clone()));
                    info!("📣 Ticket {} called by staff {}", called.number, staff_id);
                    self.events
                        .publish(TicketEventKind::Called, called.clone())
                        .await;
                    return Ok(Some(called));
                }
                Err(TicketingError::Conflict(_)) => {
                    // Someone else called it first; take the next snapshot
                    debug!(
                        "🔁 call_next attempt {}/{} lost ticket {} to a concurrent caller",
                        attempt, MAX_CALL_ATTEMPTS, next.number
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(TicketingError::conflict(format!(
            "Could not call next ticket for branch '{}' service '{}' after {} attempts",
            branch_id, service_id, MAX_CALL_ATTEMPTS
        )))
    }

    /// Re-announce a called ticket
    ///
    /// `staff_id = None` keeps the current assignment; `Some` hands the
    /// ticket to another staff member. Either way `called_at` is re-set.
    pub async fn recall_ticket(&self, id: &str, staff_id: Option<String>) -> Result<Ticket> {
        let previous = self.get_ticket(id).await?;
        let reassigned = staff_id.clone();
        let ticket = self
            .perform(id, TicketAction::Recall { staff_id }, TicketEventKind::Recalled)
            .await?;

        if let Some(new_staff) = reassigned {
            if let Some(old_staff) = &previous.staff_id {
                if old_staff != &new_staff {
                    self.directory.set_staff_current_ticket(old_staff, None);
                }
            }
            self.directory
                .set_staff_current_ticket(&new_staff, Some(ticket.id.clone()));
        }
        Ok(ticket)
    }

    /// Begin serving a ticket at the counter
    ///
    /// Enforces the one-serving-ticket-per-staff invariant against the
    /// live store before transitioning.
    pub async fn start_serving(&self, id: &str) -> Result<Ticket> {
        let ticket = self.get_ticket(id).await?;
        if let Some(staff_id) = &ticket.staff_id {
            let serving = self
                .repository
                .list_tickets(&TicketFilter {
                    staff_id: Some(staff_id.clone()),
                    status: Some(TicketStatus::Serving),
                    ..Default::default()
                })
                .await?;
            if serving.iter().any(|t| t.id != ticket.id) {
                return Err(TicketingError::validation(format!(
                    "Staff '{}' is already serving another ticket",
                    staff_id
                )));
            }
        }
        self.perform(id, TicketAction::StartServing, TicketEventKind::ServingStarted)
            .await
    }

    /// Complete a ticket and free its staff member
    pub async fn complete_ticket(&self, id: &str) -> Result<Ticket> {
        let ticket = self
            .perform(id, TicketAction::Complete, TicketEventKind::Completed)
            .await?;
        if let Some(staff_id) = &ticket.staff_id {
            self.directory.set_staff_current_ticket(staff_id, None);
        }
        Ok(ticket)
    }

    /// Mark a ticket's customer as absent and free its staff member
    pub async fn no_show_ticket(&self, id: &str) -> Result<Ticket> {
        let ticket = self
            .perform(id, TicketAction::NoShow, TicketEventKind::NoShow)
            .await?;
        if let Some(staff_id) = &ticket.staff_id {
            self.directory.set_staff_current_ticket(staff_id, None);
        }
        Ok(ticket)
    }

    /// Cancel a ticket
    pub async fn cancel_ticket(&self, id: &str) -> Result<Ticket> {
        self.perform(id, TicketAction::Cancel, TicketEventKind::Cancelled)
            .await
    }

    /// Move a waiting ticket to another service queue
    ///
    /// The ticket keeps its number and creation time but re-enters the
    /// target queue behind existing tickets of equal priority.
    pub async fn transfer_ticket(&self, id: &str, service_id: &str) -> Result<Ticket> {
        if self.directory.get_service(service_id).is_none() {
            return Err(TicketingError::validation(format!(
                "Service '{}' does not exist",
                service_id
            )));
        }
        self.perform(
            id,
            TicketAction::Transfer {
                service_id: service_id.to_string(),
            },
            TicketEventKind::Transferred,
        )
        .await
    }

    /// Run one lifecycle action end to end: validate, guard, commit, emit
    async fn perform(
        &self,
        id: &str,
        action: TicketAction,
        kind: TicketEventKind,
    ) -> Result<Ticket> {
        let ticket = self.get_ticket(id).await?;
        let patch = lifecycle::transition_patch(&ticket, &action, Utc::now())?;

        let updated = match self
            .repository
            .update_ticket_guarded(id, lifecycle::allowed_sources(&action), &patch)
            .await
        {
            Ok(updated) => updated,
            Err(TicketingError::Conflict(msg)) => {
                // The race may have made the action illegal outright;
                // re-read and report the sharper error when it has.
                let current = self.get_ticket(id).await?;
                if lifecycle::is_action_allowed(current.status, &action) {
                    return Err(TicketingError::Conflict(msg));
                }
                return Err(TicketingError::invalid_transition(format!(
                    "Cannot {} ticket {} in status '{}'",
                    action, current.number, current.status
                )));
            }
            Err(e) => return Err(e),
        };

        info!("🎫 Ticket {} {} -> '{}'", updated.number, action, updated.status);
        self.events.publish(kind, updated.clone()).await;
        Ok(updated)
    }

    // ========================================================================
    // Position and estimation
    // ========================================================================

    /// A waiting ticket's place in line and wait estimate
    ///
    /// `Ok(None)` for tickets past `waiting`: position is meaningless
    /// once called. Recomputed from a fresh snapshot on every call.
    pub async fn ticket_position(&self, id: &str) -> Result<Option<QueuePosition>> {
        let ticket = self.get_ticket(id).await?;
        if ticket.status != TicketStatus::Waiting {
            return Ok(None);
        }

        let cohort = self
            .repository
            .list_tickets(&TicketFilter::waiting_cohort(
                &ticket.branch_id,
                &ticket.service_id,
            ))
            .await?;
        Ok(position::compute_position(
            &cohort,
            &ticket.id,
            self.service_minutes(&ticket.service_id),
        ))
    }

    // ========================================================================
    // Dashboards and reporting
    // ========================================================================

    /// Statistics for a day (default: today), optionally scoped to a branch
    pub async fn statistics(
        &self,
        branch_id: Option<&str>,
        date: Option<NaiveDate>,
    ) -> Result<QueueStatistics> {
        let tickets = self
            .repository
            .list_tickets(&TicketFilter {
                branch_id: branch_id.map(str::to_string),
                date: Some(date.unwrap_or_else(|| self.today())),
                ..Default::default()
            })
            .await?;
        Ok(stats::compute_statistics(&tickets))
    }

    /// Serving tickets enriched for wall displays
    pub async fn currently_serving(&self, branch_id: Option<&str>) -> Result<Vec<ServingTicket>> {
        let serving = self
            .repository
            .list_tickets(&TicketFilter {
                branch_id: branch_id.map(str::to_string),
                status: Some(TicketStatus::Serving),
                ..Default::default()
            })
            .await?;

        Ok(serving
            .into_iter()
            .map(|ticket| {
                let staff = ticket
                    .staff_id
                    .as_deref()
                    .and_then(|id| self.directory.get_staff(id));
                let service_name = self
                    .directory
                    .get_service(&ticket.service_id)
                    .map(|s| s.name);
                ServingTicket {
                    staff_name: staff.as_ref().map(|s| s.name.clone()),
                    counter: staff.and_then(|s| s.counter),
                    service_name,
                    ticket,
                }
            })
            .collect())
    }

    /// Size of a waiting cohort
    pub async fn waiting_count(
        &self,
        branch_id: &str,
        service_id: Option<&str>,
    ) -> Result<usize> {
        let waiting = self
            .repository
            .list_tickets(&TicketFilter {
                branch_id: Some(branch_id.to_string()),
                service_id: service_id.map(str::to_string),
                status: Some(TicketStatus::Waiting),
                ..Default::default()
            })
            .await?;
        Ok(waiting.len())
    }

    /// Tickets created per service-clock hour of a branch's day
    pub async fn peak_hours(
        &self,
        branch_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<[usize; 24]> {
        let tickets = self
            .repository
            .list_tickets(&TicketFilter {
                branch_id: Some(branch_id.to_string()),
                date: Some(date.unwrap_or_else(|| self.today())),
                ..Default::default()
            })
            .await?;
        Ok(stats::peak_hours(
            &tickets,
            self.config.general.timezone_offset_minutes,
        ))
    }

    /// One staff member's numbers for a day
    pub async fn staff_performance(
        &self,
        staff_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<StaffPerformance> {
        let tickets = self
            .repository
            .list_tickets(&TicketFilter {
                staff_id: Some(staff_id.to_string()),
                date: Some(date.unwrap_or_else(|| self.today())),
                ..Default::default()
            })
            .await?;
        Ok(stats::compute_staff_performance(&tickets))
    }

    /// Export tickets as CSV, enriched with directory names
    ///
    /// Header row first; values containing commas are double-quoted. An
    /// empty selection exports as an empty string.
    pub async fn export_tickets_csv(
        &self,
        branch_id: Option<&str>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<String> {
        let mut tickets = self
            .repository
            .list_tickets(&TicketFilter {
                branch_id: branch_id.map(str::to_string),
                ..Default::default()
            })
            .await?;
        if let Some(from) = from {
            tickets.retain(|t| t.created_at >= from);
        }
        if let Some(to) = to {
            tickets.retain(|t| t.created_at <= to);
        }
        if tickets.is_empty() {
            return Ok(String::new());
        }

        let format_ts = |ts: DateTime<Utc>| ts.format("%Y-%m-%d %H:%M").to_string();
        let mut rows = vec![
            "Ticket Number,Branch,Service,Staff,Status,Created,Called,Completed,Wait Time (min),Service Time (min)"
                .to_string(),
        ];
        for ticket in &tickets {
            let branch = self
                .directory
                .get_branch(&ticket.branch_id)
                .map(|b| b.name)
                .unwrap_or_default();
            let service = self
                .directory
                .get_service(&ticket.service_id)
                .map(|s| s.name)
                .unwrap_or_default();
            let staff = ticket
                .staff_id
                .as_deref()
                .and_then(|id| self.directory.get_staff(id))
                .map(|s| s.name)
                .unwrap_or_else(|| "N/A".to_string());

            let wait = ticket
                .called_at
                .map(|called| stats::minutes_between(ticket.created_at, called).to_string())
                .unwrap_or_else(|| "N/A".to_string());
            let service_time = match (ticket.served_at, ticket.completed_at) {
                (Some(served), Some(completed)) => {
                    stats::minutes_between(served, completed).to_string()
                }
                _ => "N/A".to_string(),
            };

            let fields = [
                ticket.number.clone(),
                branch,
                service,
                staff,
                ticket.status.to_string(),
                format_ts(ticket.created_at),
                ticket.called_at.map(format_ts).unwrap_or_else(|| "N/A".to_string()),
                ticket
                    .completed_at
                    .map(format_ts)
                    .unwrap_or_else(|| "N/A".to_string()),
                wait,
                service_time,
            ];
            rows.push(
                fields
                    .iter()
                    .map(|field| csv_field(field))
                    .collect::<Vec<_>>()
                    .join(","),
            );
        }

        if tickets.len() > 500 {
            warn!("📤 Large CSV export: {} tickets", tickets.len());
        }
        Ok(rows.join("\n"))
    }
}

/// Double-quote a CSV value when it contains a comma
fn csv_field(value: &str) -> String {
    if value.contains(',') {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}
