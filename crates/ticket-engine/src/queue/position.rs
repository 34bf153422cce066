//! Position and wait-time estimation
//!
//! Computed fresh from a waiting-cohort snapshot on every request; the
//! estimate is a hint for customers, not a promise.

use serde::Serialize;

use crate::queue::ordering;
use crate::types::{Ticket, TicketStatus};

/// A waiting ticket's place in line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuePosition {
    /// 1-based place in the call order
    pub position: usize,
    /// Size of the waiting cohort
    pub total: usize,
    /// `position × service duration`, in minutes
    pub estimated_wait_time: i64,
}

/// Locate `ticket_id` within its waiting cohort
///
/// `cohort` is every waiting ticket of the same (branch, service) pair,
/// in any order. Returns `None` when the ticket is not in the cohort,
/// which covers both "not waiting anymore" and "never existed here".
pub fn compute_position(
    cohort: &[Ticket],
    ticket_id: &str,
    service_minutes: i64,
) -> Option<QueuePosition> {
    let mut ordered: Vec<&Ticket> = cohort
        .iter()
        .filter(|t| t.status == TicketStatus::Waiting)
        .collect();
    ordered.sort_by(|a, b| ordering::waiting_order(a, b));

    let index = ordered.iter().position(|t| t.id == ticket_id)?;
    let position = index + 1;
    Some(QueuePosition {
        position,
        total: ordered.len(),
        estimated_wait_time: position as i64 * service_minutes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn waiting(id: &str, priority: i32, seconds_ago: i64) -> Ticket {
        Ticket {
            id: id.to_string(),
            number: "A-001".to_string(),
            branch_id: "branch-1".to_string(),
            service_id: "service-1".to_string(),
            staff_id: None,
            status: TicketStatus::Waiting,
            priority,
            created_at: Utc::now() - Duration::seconds(seconds_ago),
            called_at: None,
            served_at: None,
            completed_at: None,
            estimated_wait_time: 0,
            notes: String::new(),
        }
    }

    #[test]
    fn middle_of_the_queue() {
        let cohort = vec![waiting("t-1", 1, 30), waiting("t-2", 1, 20), waiting("t-3", 1, 10)];
        let position = compute_position(&cohort, "t-2", 15).unwrap();
        assert_eq!(position, QueuePosition { position: 2, total: 3, estimated_wait_time: 30 });
    }

    #[test]
    fn priority_jumps_the_line() {
        let cohort = vec![waiting("t-1", 1, 30), waiting("t-vip", 5, 5)];
        let vip = compute_position(&cohort, "t-vip", 10).unwrap();
        assert_eq!(vip.position, 1);
        assert_eq!(vip.estimated_wait_time, 10);

        let regular = compute_position(&cohort, "t-1", 10).unwrap();
        assert_eq!(regular.position, 2);
        assert_eq!(regular.estimated_wait_time, 20);
    }

    #[test]
    fn missing_or_non_waiting_tickets_have_no_position() {
        let mut called = waiting("t-called", 1, 30);
        called.status = TicketStatus::Called;
        let cohort = vec![called, waiting("t-2", 1, 10)];

        assert!(compute_position(&cohort, "t-called", 15).is_none());
        assert!(compute_position(&cohort, "t-missing", 15).is_none());

        let remaining = compute_position(&cohort, "t-2", 15).unwrap();
        // The called ticket is not part of the waiting total
        assert_eq!(remaining.total, 1);
        assert_eq!(remaining.position, 1);
    }
}
