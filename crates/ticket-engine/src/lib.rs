//! # QueueHub Ticket Engine
//!
//! A multi-tenant queue-ticketing engine: customers take a sequential
//! ticket for a service at an organization branch, staff call and process
//! tickets, and dashboards show live status. The crate's core is the
//! queue ordering and position/wait-time estimation logic; everything
//! around it (directory, persistence, events, REST) exists to feed that
//! core.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐
//! │  TicketClient   │   │  SupervisorApi  │   │    AdminApi     │
//! └─────────────────┘   └─────────────────┘   └─────────────────┘
//!           │                     │                     │
//!           └─────────────────────┼─────────────────────┘
//!                                 │
//!                      ┌─────────────────┐
//!                      │ TicketingEngine │
//!                      └─────────────────┘
//!                                 │
//!          ┌──────────────────────┼──────────────────────┐
//!          │                      │                      │
//! ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐
//! │    Directory    │   │  Queue ordering │   │ TicketEventBus  │
//! └─────────────────┘   └─────────────────┘   └─────────────────┘
//!                                 │
//!                      ┌─────────────────┐
//!                      │TicketRepository │ (SQLite or in-memory)
//!                      └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use queuehub_ticket_engine::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let engine = TicketingEngine::new(TicketingConfig::default()).await?;
//!
//! // Register a bank branch offering one service
//! let org = Organization::new("Metro Bank", OrganizationKind::Bank);
//! let org_id = org.id.clone();
//! engine.directory().register_organization(org);
//! let branch = Branch::new(org_id, "Downtown".to_string());
//! engine.directory().register_branch(branch.clone())?;
//! let service = Service::new(branch.id.clone(), "Deposits".to_string(), 15);
//! engine.directory().register_service(service.clone())?;
//! let staff = Staff::new(branch.id.clone(), "Alice".to_string(), None);
//! engine.directory().register_staff(staff.clone())?;
//!
//! // A customer takes a ticket...
//! let ticket = engine
//!     .create_ticket(CreateTicketRequest {
//!         branch_id: branch.id.clone(),
//!         service_id: service.id.clone(),
//!         priority: None,
//!         notes: None,
//!     })
//!     .await?;
//! println!("🎫 {}", ticket.number); // A-001
//!
//! // ...and staff calls the next one in line
//! let called = engine.call_next(&branch.id, &service.id, &staff.id).await?;
//! assert_eq!(called.unwrap().id, ticket.id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Key Modules
//!
//! - [`orchestrator`]: the [`TicketingEngine`] coordinating every operation
//! - [`queue`]: ordering, position estimation, and statistics (pure functions)
//! - [`lifecycle`]: the status transition table and patch construction
//! - [`numbering`]: category prefixes and daily ticket numbers
//! - [`directory`]: organizations, branches, services, staff
//! - [`database`]: the repository trait with SQLite and in-memory backends
//! - [`monitoring`]: the broadcast event bus driving live displays
//! - [`api`]: role-scoped facades and the REST router
//! - [`server`]: deployable server wrapper and builder
//!
//! ## Guarantees
//!
//! - Ticket numbers are unique and strictly increasing per (day, category
//!   prefix), issued by an atomic counter.
//! - Status changes follow the lifecycle table; a racing transition loses
//!   cleanly with a conflict instead of overwriting the winner.
//! - Position and wait estimates are recomputed from a fresh snapshot for
//!   every request.

// Core modules
pub mod config;
pub mod error;

// Domain
pub mod directory;
pub mod lifecycle;
pub mod numbering;
pub mod queue;
pub mod types;

// Infrastructure
pub mod database;
pub mod monitoring;

// Coordination and surfaces
pub mod api;
pub mod orchestrator;
pub mod server;

// Re-exports for convenience
pub use config::TicketingConfig;
pub use error::{Result, TicketingError};
pub use orchestrator::TicketingEngine;

pub use api::{AdminApi, SupervisorApi, TicketClient};
pub use server::{TicketingServer, TicketingServerBuilder};

/// Prelude module for convenient imports
///
/// ```
/// use queuehub_ticket_engine::prelude::*;
/// ```
pub mod prelude {
    //! Commonly used types for queue-ticketing applications

    pub use crate::{Result, TicketingConfig, TicketingError};

    pub use crate::orchestrator::{ServingTicket, TicketingEngine};
    pub use crate::server::{DemoDirectory, TicketingServer, TicketingServerBuilder};

    pub use crate::api::{AdminApi, SupervisorApi, TicketClient};

    pub use crate::config::{ApiConfig, GeneralConfig, QueueBehaviorConfig};

    pub use crate::types::{
        CreateTicketRequest, Ticket, TicketFilter, TicketPatch, TicketStatus,
    };

    pub use crate::directory::{
        Branch, Directory, Organization, OrganizationKind, Service, Staff,
    };

    pub use crate::lifecycle::TicketAction;
    pub use crate::queue::{QueuePosition, QueueStatistics, StaffPerformance};
    pub use crate::monitoring::{TicketEvent, TicketEventBus, TicketEventKind};

    pub use crate::database::{MemoryTicketStore, SqliteTicketStore, TicketRepository};

    // Common external types
    pub use chrono::{DateTime, NaiveDate, Utc};
    pub use uuid::Uuid;
}
