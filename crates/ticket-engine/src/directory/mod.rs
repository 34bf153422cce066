//! # Organization / Branch / Service / Staff Directory
//!
//! In-process registry for the entities tickets reference. The engine
//! validates branch and service ids against this directory at ticket
//! creation, resolves ticket-number prefixes from the owning
//! organization's kind, and tracks each staff member's current ticket.
//!
//! The directory is concurrency-safe (dashmap) and intentionally does not
//! police removals: deleting a branch with live services is an
//! administrative concern, not an engine one.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, TicketingError};

/// Organization kind, the ticket-number namespace selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationKind {
    Bank,
    Clinic,
    Government,
    Passport,
    Tax,
    Other,
}

/// A tenant organization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub kind: OrganizationKind,
}

impl Organization {
    pub fn new<S: Into<String>>(name: S, kind: OrganizationKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
        }
    }
}

/// A physical branch of an organization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: String,
    pub organization_id: String,
    pub name: String,
}

impl Branch {
    pub fn new<S: Into<String>>(organization_id: S, name: S) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            organization_id: organization_id.into(),
            name: name.into(),
        }
    }
}

/// A service offered at a branch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub branch_id: String,
    pub name: String,
    /// Expected minutes to serve one customer; drives wait estimates
    pub estimated_duration: i64,
}

impl Service {
    pub fn new<S: Into<String>>(branch_id: S, name: S, estimated_duration: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            branch_id: branch_id.into(),
            name: name.into(),
            estimated_duration,
        }
    }
}

/// A staff member working a counter at a branch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: String,
    pub branch_id: String,
    pub name: String,
    /// Counter label shown on the board, e.g. "Counter 3"
    pub counter: Option<String>,
    /// Services this staff member handles
    pub service_ids: Vec<String>,
    /// The ticket currently assigned to this staff member, if any
    pub current_ticket_id: Option<String>,
}

impl Staff {
    pub fn new<S: Into<String>>(branch_id: S, name: S, counter: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            branch_id: branch_id.into(),
            name: name.into(),
            counter,
            service_ids: Vec::new(),
            current_ticket_id: None,
        }
    }
}

/// Directory entity counts
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryStats {
    pub organizations: usize,
    pub branches: usize,
    pub services: usize,
    pub staff: usize,
}

/// Concurrent registry of organizations, branches, services and staff
pub struct Directory {
    organizations: DashMap<String, Organization>,
    branches: DashMap<String, Branch>,
    services: DashMap<String, Service>,
    staff: DashMap<String, Staff>,
}

impl Directory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self {
            organizations: DashMap::new(),
            branches: DashMap::new(),
            services: DashMap::new(),
            staff: DashMap::new(),
        }
    }

    /// Register an organization, replacing any existing entry with the same id
    pub fn register_organization(&self, organization: Organization) {
        info!("🏢 Registered organization '{}' ({:?})", organization.name, organization.kind);
        self.organizations
            .insert(organization.id.clone(), organization);
    }

    /// Register a branch; its owning organization must exist
    pub fn register_branch(&self, branch: Branch) -> Result<()> {
        if !self.organizations.contains_key(&branch.organization_id) {
            return Err(TicketingError::validation(format!(
                "Organization '{}' does not exist",
                branch.organization_id
            )));
        }
        info!("🏠 Registered branch '{}'", branch.name);
        self.branches.insert(branch.id.clone(), branch);
        Ok(())
    }

    /// Register a service; its branch must exist
    pub fn register_service(&self, service: Service) -> Result<()> {
        if !self.branches.contains_key(&service.branch_id) {
            return Err(TicketingError::validation(format!(
                "Branch '{}' does not exist",
                service.branch_id
            )));
        }
        info!(
            "🛎️ Registered service '{}' ({} min)",
            service.name, service.estimated_duration
        );
        self.services.insert(service.id.clone(), service);
        Ok(())
    }

    /// Register a staff member; their branch must exist
    pub fn register_staff(&self, staff: Staff) -> Result<()> {
        if !self.branches.contains_key(&staff.branch_id) {
            return Err(TicketingError::validation(format!(
                "Branch '{}' does not exist",
                staff.branch_id
            )));
        }
        info!("👤 Registered staff member '{}'", staff.name);
        self.staff.insert(staff.id.clone(), staff);
        Ok(())
    }

    pub fn get_organization(&self, id: &str) -> Option<Organization> {
        self.organizations.get(id).map(|entry| entry.clone())
    }

    pub fn get_branch(&self, id: &str) -> Option<Branch> {
        self.branches.get(id).map(|entry| entry.clone())
    }

    pub fn get_service(&self, id: &str) -> Option<Service> {
        self.services.get(id).map(|entry| entry.clone())
    }

    pub fn get_staff(&self, id: &str) -> Option<Staff> {
        self.staff.get(id).map(|entry| entry.clone())
    }

    pub fn list_organizations(&self) -> Vec<Organization> {
        self.organizations
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn list_branches(&self) -> Vec<Branch> {
        self.branches
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Services of one branch
    pub fn list_services(&self, branch_id: &str) -> Vec<Service> {
        self.services
            .iter()
            .filter(|entry| entry.value().branch_id == branch_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Staff of one branch
    pub fn list_staff(&self, branch_id: &str) -> Vec<Staff> {
        self.staff
            .iter()
            .filter(|entry| entry.value().branch_id == branch_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn remove_organization(&self, id: &str) -> bool {
        self.organizations.remove(id).is_some()
    }

    pub fn remove_branch(&self, id: &str) -> bool {
        self.branches.remove(id).is_some()
    }

    pub fn remove_service(&self, id: &str) -> bool {
        self.services.remove(id).is_some()
    }

    pub fn remove_staff(&self, id: &str) -> bool {
        self.staff.remove(id).is_some()
    }

    /// Organization kind of the branch's owner (drives the number prefix)
    pub fn organization_kind_for_branch(&self, branch_id: &str) -> Option<OrganizationKind> {
        let branch = self.branches.get(branch_id)?;
        self.organizations
            .get(&branch.organization_id)
            .map(|org| org.kind)
    }

    /// Estimated duration of a service in minutes
    pub fn service_duration(&self, service_id: &str) -> Option<i64> {
        self.services
            .get(service_id)
            .map(|service| service.estimated_duration)
    }

    /// Point a staff member's current-ticket reference at `ticket_id`
    ///
    /// `None` clears the reference. Missing staff ids are ignored: ticket
    /// lifecycle must not fail because a staff record was removed.
    pub fn set_staff_current_ticket(&self, staff_id: &str, ticket_id: Option<String>) {
        if let Some(mut staff) = self.staff.get_mut(staff_id) {
            debug!(
                "👤 Staff {} current ticket: {:?} → {:?}",
                staff_id, staff.current_ticket_id, ticket_id
            );
            staff.current_ticket_id = ticket_id;
        }
    }

    /// Assign a service to a staff member
    pub fn assign_staff_service(&self, staff_id: &str, service_id: &str) -> Result<()> {
        let mut staff = self.staff.get_mut(staff_id).ok_or_else(|| {
            TicketingError::not_found(format!("Staff '{}' not found", staff_id))
        })?;
        if !staff.service_ids.iter().any(|id| id == service_id) {
            staff.service_ids.push(service_id.to_string());
        }
        Ok(())
    }

    /// Entity counts for dashboards
    pub fn stats(&self) -> DirectoryStats {
        DirectoryStats {
            organizations: self.organizations.len(),
            branches: self.branches.len(),
            services: self.services.len(),
            staff: self.staff.len(),
        }
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (Directory, Branch, Service, Staff) {
        let directory = Directory::new();
        let org = Organization::new("Metro Bank", OrganizationKind::Bank);
        let org_id = org.id.clone();
        directory.register_organization(org);

        let branch = Branch::new(org_id, "Downtown".to_string());
        directory.register_branch(branch.clone()).unwrap();

        let service = Service::new(branch.id.clone(), "Deposits".to_string(), 10);
        directory.register_service(service.clone()).unwrap();

        let staff = Staff::new(
            branch.id.clone(),
            "Alice".to_string(),
            Some("Counter 1".to_string()),
        );
        directory.register_staff(staff.clone()).unwrap();

        (directory, branch, service, staff)
    }

    #[test]
    fn register_and_lookup() {
        let (directory, branch, service, staff) = seeded();

        assert_eq!(directory.get_branch(&branch.id).unwrap().name, "Downtown");
        assert_eq!(directory.service_duration(&service.id), Some(10));
        assert_eq!(directory.get_staff(&staff.id).unwrap().name, "Alice");
        assert_eq!(
            directory.organization_kind_for_branch(&branch.id),
            Some(OrganizationKind::Bank)
        );

        let stats = directory.stats();
        assert_eq!(stats.organizations, 1);
        assert_eq!(stats.branches, 1);
        assert_eq!(stats.services, 1);
        assert_eq!(stats.staff, 1);
    }

    #[test]
    fn registration_requires_parent() {
        let directory = Directory::new();
        let branch = Branch::new("missing-org".to_string(), "Nowhere".to_string());
        assert!(directory.register_branch(branch).is_err());

        let service = Service::new("missing-branch".to_string(), "Ghost".to_string(), 5);
        assert!(directory.register_service(service).is_err());
    }

    #[test]
    fn staff_current_ticket_tracking() {
        let (directory, _, _, staff) = seeded();

        directory.set_staff_current_ticket(&staff.id, Some("ticket-1".to_string()));
        assert_eq!(
            directory.get_staff(&staff.id).unwrap().current_ticket_id,
            Some("ticket-1".to_string())
        );

        directory.set_staff_current_ticket(&staff.id, None);
        assert!(directory
            .get_staff(&staff.id)
            .unwrap()
            .current_ticket_id
            .is_none());

        // Unknown staff ids are a no-op
        directory.set_staff_current_ticket("missing", Some("ticket-2".to_string()));
    }

    #[test]
    fn list_is_scoped_to_branch() {
        let (directory, branch, _, _) = seeded();
        let other_org = Organization::new("City Clinic", OrganizationKind::Clinic);
        let other_org_id = other_org.id.clone();
        directory.register_organization(other_org);
        let other_branch = Branch::new(other_org_id, "Uptown".to_string());
        directory.register_branch(other_branch.clone()).unwrap();
        directory
            .register_service(Service::new(
                other_branch.id.clone(),
                "Checkup".to_string(),
                20,
            ))
            .unwrap();

        assert_eq!(directory.list_services(&branch.id).len(), 1);
        assert_eq!(directory.list_services(&other_branch.id).len(), 1);
        assert_eq!(directory.list_branches().len(), 2);
    }

    #[test]
    fn remove_returns_whether_present() {
        let (directory, branch, _, _) = seeded();
        assert!(directory.remove_branch(&branch.id));
        assert!(!directory.remove_branch(&branch.id));
    }
}
