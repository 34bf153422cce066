//! Customer-facing ticket operations

use std::sync::Arc;

use crate::error::Result;
use crate::orchestrator::TicketingEngine;
use crate::queue::QueuePosition;
use crate::types::{CreateTicketRequest, Ticket};

/// Customer-side facade: take a ticket, watch your place, cancel
///
/// ## Examples
///
/// ```rust
/// use queuehub_ticket_engine::prelude::*;
/// use queuehub_ticket_engine::api::TicketClient;
///
/// # async fn example(engine: std::sync::Arc<TicketingEngine>, branch_id: String, service_id: String) -> Result<()> {
/// let client = TicketClient::new(engine);
///
/// let ticket = client
///     .take_ticket(CreateTicketRequest {
///         branch_id,
///         service_id,
///         priority: None,
///         notes: None,
///     })
///     .await?;
/// println!("🎫 You are {} (est. {} min)", ticket.number, ticket.estimated_wait_time);
///
/// if let Some(position) = client.my_position(&ticket.id).await? {
///     println!("Position {} of {}", position.position, position.total);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TicketClient {
    engine: Arc<TicketingEngine>,
}

impl TicketClient {
    /// Create a client facade over the engine
    pub fn new(engine: Arc<TicketingEngine>) -> Self {
        Self { engine }
    }

    /// Take a ticket for a service
    pub async fn take_ticket(&self, request: CreateTicketRequest) -> Result<Ticket> {
        self.engine.create_ticket(request).await
    }

    /// Fetch a ticket by id
    pub async fn get_ticket(&self, id: &str) -> Result<Ticket> {
        self.engine.get_ticket(id).await
    }

    /// Look a ticket up by its printed number
    pub async fn find_by_number(&self, number: &str) -> Result<Ticket> {
        self.engine.get_ticket_by_number(number).await
    }

    /// Current place in line; `None` once the ticket has been called
    pub async fn my_position(&self, ticket_id: &str) -> Result<Option<QueuePosition>> {
        self.engine.ticket_position(ticket_id).await
    }

    /// How many customers are waiting ahead of a fresh ticket
    pub async fn waiting_count(
        &self,
        branch_id: &str,
        service_id: Option<&str>,
    ) -> Result<usize> {
        self.engine.waiting_count(branch_id, service_id).await
    }

    /// Withdraw a ticket
    pub async fn cancel_ticket(&self, ticket_id: &str) -> Result<Ticket> {
        self.engine.cancel_ticket(ticket_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TicketingConfig;
    use crate::database::MemoryTicketStore;
    use crate::directory::{Branch, Organization, OrganizationKind, Service};
    use crate::types::TicketStatus;

    async fn seeded_client() -> (TicketClient, String, String) {
        let engine = TicketingEngine::with_repository(
            TicketingConfig::default(),
            Arc::new(MemoryTicketStore::new(0)),
        );
        let org = Organization::new("City Clinic", OrganizationKind::Clinic);
        let org_id = org.id.clone();
        engine.directory().register_organization(org);
        let branch = Branch::new(org_id, "Uptown".to_string());
        engine.directory().register_branch(branch.clone()).unwrap();
        let service = Service::new(branch.id.clone(), "Checkup".to_string(), 20);
        engine.directory().register_service(service.clone()).unwrap();

        (TicketClient::new(engine), branch.id, service.id)
    }

    #[tokio::test]
    async fn take_position_cancel_round_trip() {
        let (client, branch_id, service_id) = seeded_client().await;

        let ticket = client
            .take_ticket(CreateTicketRequest {
                branch_id: branch_id.clone(),
                service_id: service_id.clone(),
                priority: None,
                notes: None,
            })
            .await
            .unwrap();
        assert_eq!(ticket.number, "B-001");

        let found = client.find_by_number("B-001").await.unwrap();
        assert_eq!(found.id, ticket.id);

        let position = client.my_position(&ticket.id).await.unwrap().unwrap();
        assert_eq!(position.position, 1);
        assert_eq!(position.estimated_wait_time, 20);
        assert_eq!(client.waiting_count(&branch_id, None).await.unwrap(), 1);

        let cancelled = client.cancel_ticket(&ticket.id).await.unwrap();
        assert_eq!(cancelled.status, TicketStatus::Cancelled);
        assert!(client.my_position(&ticket.id).await.unwrap().is_none());
    }
}
