//! # TicketingServer - deployable server wrapper
//!
//! Owns an engine plus the role-scoped API facades and the REST listener
//! task. Binaries and examples talk to this instead of wiring the pieces
//! themselves.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use queuehub_ticket_engine::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let mut server = TicketingServerBuilder::new()
//!     .with_in_memory_database()
//!     .build()
//!     .await?;
//!
//! server.create_demo_directory()?;
//! server.start().await?;
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::api::{AdminApi, SupervisorApi, TicketClient};
use crate::api::rest;
use crate::config::TicketingConfig;
use crate::directory::OrganizationKind;
use crate::error::{Result, TicketingError};
use crate::orchestrator::TicketingEngine;

/// Ids of the entities [`TicketingServer::create_demo_directory`] seeds
#[derive(Debug, Clone)]
pub struct DemoDirectory {
    pub organization_id: String,
    pub branch_id: String,
    pub service_ids: Vec<String>,
    pub staff_ids: Vec<String>,
}

/// A complete ticketing server: engine, APIs, REST listener
pub struct TicketingServer {
    engine: Arc<TicketingEngine>,
    admin_api: AdminApi,
    supervisor_api: SupervisorApi,
    api_task: Option<JoinHandle<()>>,
}

impl TicketingServer {
    /// Create a server from configuration
    pub async fn new(config: TicketingConfig) -> Result<Self> {
        let engine = TicketingEngine::new(config).await?;
        Ok(Self {
            admin_api: AdminApi::new(engine.clone()),
            supervisor_api: SupervisorApi::new(engine.clone()),
            engine,
            api_task: None,
        })
    }

    /// Start the REST listener, when enabled
    pub async fn start(&mut self) -> Result<()> {
        if !self.engine.config().api.enabled {
            info!("🌐 REST API disabled by configuration");
            return Ok(());
        }

        let bind_addr = self.engine.config().api.bind_addr;
        let listener = tokio::net::TcpListener::bind(bind_addr)
            .await
            .map_err(|e| {
                TicketingError::configuration(format!("Failed to bind {}: {}", bind_addr, e))
            })?;
        let router = rest::router(self.engine.clone());

        info!("🌐 REST API listening on {}", bind_addr);
        self.api_task = Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!("💥 REST listener stopped: {}", e);
            }
        }));
        Ok(())
    }

    /// Stop the REST listener
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.api_task.take() {
            task.abort();
            info!("🛑 REST API stopped");
        }
        Ok(())
    }

    /// Run in the foreground, logging queue statistics periodically
    ///
    /// Never returns under normal operation; intended as the tail of a
    /// binary's main.
    pub async fn run(&self) -> Result<()> {
        info!("🚀 Ticketing server running");
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));
        // The first tick fires immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            match self.engine.statistics(None, None).await {
                Ok(stats) => info!(
                    "📊 Today: {} tickets, {} waiting, {} serving, {} completed ({}%)",
                    stats.total, stats.waiting, stats.serving, stats.completed, stats.completion_rate
                ),
                Err(e) => error!("💥 Failed to compute statistics: {}", e),
            }
        }
    }

    /// The directory-management API
    pub fn admin_api(&self) -> &AdminApi {
        &self.admin_api
    }

    /// The dashboards/reports API
    pub fn supervisor_api(&self) -> &SupervisorApi {
        &self.supervisor_api
    }

    /// The underlying engine handle
    pub fn engine(&self) -> &Arc<TicketingEngine> {
        &self.engine
    }

    /// A customer-side client over this server's engine
    pub fn create_client(&self) -> TicketClient {
        TicketClient::new(self.engine.clone())
    }

    /// Seed a demo organization, branch, services and staff
    ///
    /// For examples and local development; production deployments build
    /// their directory through the [`AdminApi`].
    pub fn create_demo_directory(&self) -> Result<DemoDirectory> {
        let organization = self
            .admin_api
            .create_organization("Demo Bank", OrganizationKind::Bank);
        let branch = self.admin_api.create_branch(&organization.id, "Main Branch")?;

        let deposits = self.admin_api.create_service(&branch.id, "Deposits", 10)?;
        let loans = self.admin_api.create_service(&branch.id, "Loans", 25)?;

        let alice = self
            .admin_api
            .create_staff(&branch.id, "Alice", Some("Counter 1".to_string()))?;
        let bob = self
            .admin_api
            .create_staff(&branch.id, "Bob", Some("Counter 2".to_string()))?;
        self.admin_api.assign_staff_service(&alice.id, &deposits.id)?;
        self.admin_api.assign_staff_service(&bob.id, &loans.id)?;

        info!("🏗️ Demo directory seeded (branch '{}')", branch.name);
        Ok(DemoDirectory {
            organization_id: organization.id,
            branch_id: branch.id,
            service_ids: vec![deposits.id, loans.id],
            staff_ids: vec![alice.id, bob.id],
        })
    }
}

/// Builder for [`TicketingServer`]
pub struct TicketingServerBuilder {
    config: TicketingConfig,
}

impl TicketingServerBuilder {
    pub fn new() -> Self {
        Self {
            config: TicketingConfig::default(),
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: TicketingConfig) -> Self {
        self.config = config;
        self
    }

    /// Persist tickets to a SQLite file
    pub fn with_database_path<S: Into<String>>(mut self, path: S) -> Self {
        self.config.general.database_path = Some(path.into());
        self
    }

    /// Keep tickets in memory (tests, demos)
    pub fn with_in_memory_database(mut self) -> Self {
        self.config.general.database_path = None;
        self
    }

    /// Build the server
    pub async fn build(self) -> Result<TicketingServer> {
        TicketingServer::new(self.config).await
    }
}

impl Default for TicketingServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
