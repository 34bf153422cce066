//! In-memory ticket store (dashmap)
//!
//! Mirrors the SQLite backend's semantics without a database file: per-key
//! shard locks serialize updates per ticket id, and counters increment
//! under a single mutex. Used by tests and embedded deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Result, TicketingError};
use crate::numbering;
use crate::types::{Ticket, TicketFilter, TicketPatch, TicketStatus};

use super::TicketRepository;

/// Dashmap-backed ticket store
pub struct MemoryTicketStore {
    tickets: DashMap<String, Ticket>,
    counters: Mutex<HashMap<(NaiveDate, char), i64>>,
    timezone_offset_minutes: i32,
}

impl MemoryTicketStore {
    /// Create an empty store pinned to the given service clock offset
    pub fn new(timezone_offset_minutes: i32) -> Self {
        Self {
            tickets: DashMap::new(),
            counters: Mutex::new(HashMap::new()),
            timezone_offset_minutes,
        }
    }

    fn matches(&self, ticket: &Ticket, filter: &TicketFilter) -> bool {
        if let Some(branch_id) = &filter.branch_id {
            if &ticket.branch_id != branch_id {
                return false;
            }
        }
        if let Some(service_id) = &filter.service_id {
            if &ticket.service_id != service_id {
                return false;
            }
        }
        if let Some(staff_id) = &filter.staff_id {
            if ticket.staff_id.as_deref() != Some(staff_id.as_str()) {
                return false;
            }
        }
        if let Some(status) = filter.status {
            if ticket.status != status {
                return false;
            }
        }
        if let Some(date) = filter.date {
            if numbering::day_key(ticket.created_at, self.timezone_offset_minutes) != date {
                return false;
            }
        }
        true
    }
}

impl Default for MemoryTicketStore {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl TicketRepository for MemoryTicketStore {
    async fn insert_ticket(&self, ticket: &Ticket) -> Result<()> {
        self.tickets.insert(ticket.id.clone(), ticket.clone());
        debug!("🗄️ Inserted ticket {} ({})", ticket.number, ticket.id);
        Ok(())
    }

    async fn get_ticket(&self, id: &str) -> Result<Option<Ticket>> {
        Ok(self.tickets.get(id).map(|entry| entry.clone()))
    }

    async fn get_ticket_by_number(&self, number: &str) -> Result<Option<Ticket>> {
        Ok(self
            .tickets
            .iter()
            .filter(|entry| entry.value().number == number)
            .max_by_key(|entry| entry.value().created_at)
            .map(|entry| entry.value().clone()))
    }

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = self
            .tickets
            .iter()
            .filter(|entry| self.matches(entry.value(), filter))
            .map(|entry| entry.value().clone())
            .collect();
        // Same default order as the SQLite backend
        tickets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(tickets)
    }

    async fn update_ticket(&self, id: &str, patch: &TicketPatch) -> Result<Ticket> {
        let mut entry = self
            .tickets
            .get_mut(id)
            .ok_or_else(|| TicketingError::not_found(format!("Ticket '{}' not found", id)))?;
        patch.apply(entry.value_mut());
        Ok(entry.value().clone())
    }

    async fn update_ticket_guarded(
        &self,
        id: &str,
        expected: &[TicketStatus],
        patch: &TicketPatch,
    ) -> Result<Ticket> {
        // The shard lock held by get_mut serializes competing updates, so
        // the status check and the patch commit are one atomic step.
        let mut entry = self
            .tickets
            .get_mut(id)
            .ok_or_else(|| TicketingError::not_found(format!("Ticket '{}' not found", id)))?;

        if !expected.contains(&entry.value().status) {
            let current = entry.value().status;
            debug!("⚠️ Guarded update lost the race for ticket {} (now '{}')", id, current);
            return Err(TicketingError::conflict(format!(
                "Ticket '{}' is '{}' now; another update won the race",
                id, current
            )));
        }

        patch.apply(entry.value_mut());
        Ok(entry.value().clone())
    }

    async fn delete_ticket(&self, id: &str) -> Result<bool> {
        Ok(self.tickets.remove(id).is_some())
    }

    async fn next_sequence(&self, day: NaiveDate, prefix: char) -> Result<i64> {
        let mut counters = self.counters.lock();
        let sequence = counters.entry((day, prefix)).or_insert(0);
        *sequence += 1;
        debug!("🔢 Counter {}/{} -> {}", day, prefix, sequence);
        Ok(*sequence)
    }
}
