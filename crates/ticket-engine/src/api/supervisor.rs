//! Supervisor dashboards, reports and exports

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::Result;
use crate::monitoring::TicketEvent;
use crate::orchestrator::{ServingTicket, TicketingEngine};
use crate::queue::{QueueStatistics, StaffPerformance};
use crate::types::{Ticket, TicketFilter};

/// Supervisor facade: live boards, daily numbers, exports
///
/// Read-mostly; the only mutations supervisors perform (recall,
/// transfer, no-show) go through the engine handle directly at the REST
/// layer.
///
/// ## Examples
///
/// ```rust
/// use queuehub_ticket_engine::prelude::*;
/// use queuehub_ticket_engine::api::SupervisorApi;
///
/// # async fn example(engine: std::sync::Arc<TicketingEngine>) -> Result<()> {
/// let supervisor = SupervisorApi::new(engine);
///
/// let stats = supervisor.statistics(None, None).await?;
/// println!(
///     "📊 {} tickets today, {} active, completion {}%",
///     stats.total, stats.active, stats.completion_rate
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SupervisorApi {
    engine: Arc<TicketingEngine>,
}

impl SupervisorApi {
    /// Create a supervisor facade over the engine
    pub fn new(engine: Arc<TicketingEngine>) -> Self {
        Self { engine }
    }

    /// Daily statistics, optionally scoped to a branch
    pub async fn statistics(
        &self,
        branch_id: Option<&str>,
        date: Option<NaiveDate>,
    ) -> Result<QueueStatistics> {
        self.engine.statistics(branch_id, date).await
    }

    /// The wall-display board of currently served tickets
    pub async fn board(&self, branch_id: Option<&str>) -> Result<Vec<ServingTicket>> {
        self.engine.currently_serving(branch_id).await
    }

    /// Tickets matching a filter, for drill-down views
    pub async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        self.engine.list_tickets(filter).await
    }

    /// Tickets created per hour of a branch's day
    pub async fn peak_hours(
        &self,
        branch_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<[usize; 24]> {
        self.engine.peak_hours(branch_id, date).await
    }

    /// One staff member's numbers for a day
    pub async fn staff_performance(
        &self,
        staff_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<StaffPerformance> {
        self.engine.staff_performance(staff_id, date).await
    }

    /// CSV export of tickets, optionally ranged
    pub async fn export_csv(
        &self,
        branch_id: Option<&str>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<String> {
        self.engine.export_tickets_csv(branch_id, from, to).await
    }

    /// The most recent ticket events, oldest first
    pub async fn recent_events(&self, limit: usize) -> Vec<TicketEvent> {
        self.engine.events().recent(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TicketingConfig;
    use crate::database::MemoryTicketStore;
    use crate::directory::{Branch, Organization, OrganizationKind, Service, Staff};
    use crate::types::CreateTicketRequest;

    #[tokio::test]
    async fn statistics_and_board_reflect_activity() {
        let engine = TicketingEngine::with_repository(
            TicketingConfig::default(),
            Arc::new(MemoryTicketStore::new(0)),
        );
        let org = Organization::new("Tax Office", OrganizationKind::Tax);
        let org_id = org.id.clone();
        engine.directory().register_organization(org);
        let branch = Branch::new(org_id, "Central".to_string());
        engine.directory().register_branch(branch.clone()).unwrap();
        let service = Service::new(branch.id.clone(), "Declarations".to_string(), 15);
        engine.directory().register_service(service.clone()).unwrap();
        let staff = Staff::new(branch.id.clone(), "Bob".to_string(), None);
        engine.directory().register_staff(staff.clone()).unwrap();

        let supervisor = SupervisorApi::new(engine.clone());

        let empty = supervisor.statistics(Some(&branch.id), None).await.unwrap();
        assert_eq!(empty.total, 0);
        assert_eq!(empty.completion_rate, 0);

        let ticket = engine
            .create_ticket(CreateTicketRequest {
                branch_id: branch.id.clone(),
                service_id: service.id.clone(),
                priority: None,
                notes: None,
            })
            .await
            .unwrap();
        engine
            .call_next(&branch.id, &service.id, &staff.id)
            .await
            .unwrap();
        engine.start_serving(&ticket.id).await.unwrap();

        let stats = supervisor.statistics(Some(&branch.id), None).await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.serving, 1);
        assert_eq!(stats.active, 1);

        let board = supervisor.board(Some(&branch.id)).await.unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].ticket.number, "E-001");

        let events = supervisor.recent_events(10).await;
        // created, called, serving-started
        assert_eq!(events.len(), 3);
    }
}
