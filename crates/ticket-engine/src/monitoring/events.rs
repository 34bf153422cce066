//! # Ticket Event Bus
//!
//! Every ticket mutation publishes a [`TicketEvent`] carrying the kind of
//! change and a full snapshot of the ticket after the change. Wall
//! displays, polling clients and notification integrations subscribe here
//! instead of re-querying the store.
//!
//! Two delivery paths:
//!
//! - **Live**: a `tokio::sync::broadcast` channel; subscribers receive
//!   events as they happen and may lag or disconnect freely.
//! - **History**: a bounded ring of recent events for late subscribers
//!   and dashboard catch-up.
//!
//! Publishing never blocks and never fails: a closed or lagging channel
//! is logged at debug level and the mutation proceeds. Core correctness
//! must not depend on anyone listening.
//!
//! ## Examples
//!
//! ```rust
//! use queuehub_ticket_engine::monitoring::{TicketEventBus, TicketEventKind};
//!
//! # async fn example(bus: TicketEventBus) {
//! let mut events = bus.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         println!("🎫 {} -> {:?}", event.ticket.number, event.kind);
//!     }
//! });
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::types::Ticket;

/// What happened to the ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TicketEventKind {
    Created,
    Called,
    Recalled,
    ServingStarted,
    Completed,
    NoShow,
    Cancelled,
    Transferred,
    Updated,
    Deleted,
}

/// One change notification
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketEvent {
    /// Unique event identifier
    pub event_id: String,
    pub kind: TicketEventKind,
    /// Snapshot of the ticket after the change
    pub ticket: Ticket,
    pub timestamp: DateTime<Utc>,
}

/// Broadcast bus with bounded history
#[derive(Clone)]
pub struct TicketEventBus {
    broadcaster: broadcast::Sender<TicketEvent>,
    history: Arc<RwLock<VecDeque<TicketEvent>>>,
    history_limit: usize,
}

impl TicketEventBus {
    /// Create a bus retaining up to `history_limit` recent events
    pub fn new(history_limit: usize) -> Self {
        let (broadcaster, _) = broadcast::channel(256);
        Self {
            broadcaster,
            history: Arc::new(RwLock::new(VecDeque::with_capacity(history_limit.min(256)))),
            history_limit,
        }
    }

    /// Subscribe to live events
    ///
    /// The receiver misses events published before this call; use
    /// [`recent`](Self::recent) to catch up.
    pub fn subscribe(&self) -> broadcast::Receiver<TicketEvent> {
        self.broadcaster.subscribe()
    }

    /// Publish a change notification
    ///
    /// Best-effort by design: errors from the broadcast channel (no
    /// subscribers) are logged and swallowed so ticket mutations never
    /// depend on listeners.
    pub async fn publish(&self, kind: TicketEventKind, ticket: Ticket) {
        let event = TicketEvent {
            event_id: Uuid::new_v4().to_string(),
            kind,
            ticket,
            timestamp: Utc::now(),
        };

        {
            let mut history = self.history.write().await;
            if history.len() >= self.history_limit {
                history.pop_front();
            }
            history.push_back(event.clone());
        }

        if let Err(e) = self.broadcaster.send(event) {
            debug!("📡 No live subscribers for ticket event: {}", e);
        }
    }

    /// The most recent events, oldest first, at most `limit`
    pub async fn recent(&self, limit: usize) -> Vec<TicketEvent> {
        let history = self.history.read().await;
        history
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.broadcaster.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TicketStatus;

    fn sample_ticket(number: &str) -> Ticket {
        Ticket {
            id: Ticket::new_id(),
            number: number.to_string(),
            branch_id: "branch-1".to_string(),
            service_id: "service-1".to_string(),
            staff_id: None,
            status: TicketStatus::Waiting,
            priority: 1,
            created_at: Utc::now(),
            called_at: None,
            served_at: None,
            completed_at: None,
            estimated_wait_time: 0,
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = TicketEventBus::new(16);
        let mut receiver = bus.subscribe();

        bus.publish(TicketEventKind::Created, sample_ticket("A-001"))
            .await;

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.kind, TicketEventKind::Created);
        assert_eq!(event.ticket.number, "A-001");
    }

    #[tokio::test]
    async fn publish_without_subscribers_succeeds() {
        let bus = TicketEventBus::new(16);
        // Must not error or panic
        bus.publish(TicketEventKind::Called, sample_ticket("A-002"))
            .await;
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn history_is_bounded_and_ordered() {
        let bus = TicketEventBus::new(3);
        for i in 1..=5 {
            bus.publish(TicketEventKind::Created, sample_ticket(&format!("A-{:03}", i)))
                .await;
        }

        let recent = bus.recent(10).await;
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].ticket.number, "A-003");
        assert_eq!(recent[2].ticket.number, "A-005");

        let last_two = bus.recent(2).await;
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].ticket.number, "A-004");
    }
}
