//! Administrative API for directory management

use std::sync::Arc;

use tracing::info;

use crate::directory::{
    Branch, DirectoryStats, Organization, OrganizationKind, Service, Staff,
};
use crate::error::Result;
use crate::orchestrator::TicketingEngine;

/// Directory management facade
///
/// Registers and removes the entities tickets reference. Admin screens
/// are out of scope for the engine; this is the programmatic surface
/// they would sit on.
///
/// ## Examples
///
/// ```rust
/// use queuehub_ticket_engine::prelude::*;
/// use queuehub_ticket_engine::api::AdminApi;
///
/// # async fn example() -> Result<()> {
/// let engine = TicketingEngine::new(TicketingConfig::default()).await?;
/// let admin = AdminApi::new(engine);
///
/// let org = admin.create_organization("Metro Bank", OrganizationKind::Bank);
/// let branch = admin.create_branch(&org.id, "Downtown")?;
/// let service = admin.create_service(&branch.id, "Deposits", 15)?;
/// let staff = admin.create_staff(&branch.id, "Alice", Some("Counter 1".to_string()))?;
/// admin.assign_staff_service(&staff.id, &service.id)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AdminApi {
    engine: Arc<TicketingEngine>,
}

impl AdminApi {
    /// Create an admin facade over the engine
    pub fn new(engine: Arc<TicketingEngine>) -> Self {
        Self { engine }
    }

    /// Register a new organization
    pub fn create_organization<S: Into<String>>(
        &self,
        name: S,
        kind: OrganizationKind,
    ) -> Organization {
        let organization = Organization::new(name.into(), kind);
        self.engine
            .directory()
            .register_organization(organization.clone());
        organization
    }

    /// Register a branch under an existing organization
    pub fn create_branch<S: Into<String>>(&self, organization_id: &str, name: S) -> Result<Branch> {
        let branch = Branch::new(organization_id.to_string(), name.into());
        self.engine.directory().register_branch(branch.clone())?;
        Ok(branch)
    }

    /// Register a service at an existing branch
    pub fn create_service<S: Into<String>>(
        &self,
        branch_id: &str,
        name: S,
        estimated_duration: i64,
    ) -> Result<Service> {
        let service = Service::new(branch_id.to_string(), name.into(), estimated_duration);
        self.engine.directory().register_service(service.clone())?;
        Ok(service)
    }

    /// Register a staff member at an existing branch
    pub fn create_staff<S: Into<String>>(
        &self,
        branch_id: &str,
        name: S,
        counter: Option<String>,
    ) -> Result<Staff> {
        let staff = Staff::new(branch_id.to_string(), name.into(), counter);
        self.engine.directory().register_staff(staff.clone())?;
        Ok(staff)
    }

    /// Add a service to a staff member's assignment list
    pub fn assign_staff_service(&self, staff_id: &str, service_id: &str) -> Result<()> {
        self.engine
            .directory()
            .assign_staff_service(staff_id, service_id)
    }

    /// All registered organizations
    pub fn list_organizations(&self) -> Vec<Organization> {
        self.engine.directory().list_organizations()
    }

    /// All registered branches
    pub fn list_branches(&self) -> Vec<Branch> {
        self.engine.directory().list_branches()
    }

    /// Services offered at a branch
    pub fn list_services(&self, branch_id: &str) -> Vec<Service> {
        self.engine.directory().list_services(branch_id)
    }

    /// Staff working at a branch
    pub fn list_staff(&self, branch_id: &str) -> Vec<Staff> {
        self.engine.directory().list_staff(branch_id)
    }

    /// Remove an organization; returns whether it existed
    pub fn remove_organization(&self, id: &str) -> bool {
        info!("🗑️ Removing organization {}", id);
        self.engine.directory().remove_organization(id)
    }

    /// Remove a branch; returns whether it existed
    pub fn remove_branch(&self, id: &str) -> bool {
        info!("🗑️ Removing branch {}", id);
        self.engine.directory().remove_branch(id)
    }

    /// Remove a service; returns whether it existed
    pub fn remove_service(&self, id: &str) -> bool {
        info!("🗑️ Removing service {}", id);
        self.engine.directory().remove_service(id)
    }

    /// Remove a staff member; returns whether they existed
    pub fn remove_staff(&self, id: &str) -> bool {
        info!("🗑️ Removing staff {}", id);
        self.engine.directory().remove_staff(id)
    }

    /// Entity counts for dashboards
    pub fn directory_stats(&self) -> DirectoryStats {
        self.engine.directory().stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TicketingConfig;
    use crate::database::MemoryTicketStore;

    fn admin() -> AdminApi {
        let engine = TicketingEngine::with_repository(
            TicketingConfig::default(),
            Arc::new(MemoryTicketStore::new(0)),
        );
        AdminApi::new(engine)
    }

    #[test]
    fn builds_a_directory_tree() {
        let admin = admin();
        let org = admin.create_organization("Metro Bank", OrganizationKind::Bank);
        let branch = admin.create_branch(&org.id, "Downtown").unwrap();
        let service = admin.create_service(&branch.id, "Deposits", 15).unwrap();
        let staff = admin
            .create_staff(&branch.id, "Alice", Some("Counter 1".to_string()))
            .unwrap();
        admin.assign_staff_service(&staff.id, &service.id).unwrap();

        assert_eq!(admin.list_branches().len(), 1);
        assert_eq!(admin.list_services(&branch.id).len(), 1);
        assert_eq!(admin.list_staff(&branch.id)[0].service_ids, vec![service.id]);

        let stats = admin.directory_stats();
        assert_eq!(stats.organizations, 1);
        assert_eq!(stats.staff, 1);
    }

    #[test]
    fn orphan_registrations_fail() {
        let admin = admin();
        assert!(admin.create_branch("missing-org", "Nowhere").is_err());
        assert!(admin.create_service("missing-branch", "Ghost", 5).is_err());
        assert!(!admin.remove_branch("missing-branch"));
    }
}
