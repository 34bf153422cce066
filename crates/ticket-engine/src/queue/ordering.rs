//! Waiting-cohort ordering
//!
//! The call order is a deterministic total order over waiting tickets:
//! higher `priority` first, then earliest `created_at` (millisecond FIFO
//! tie-break), then ticket id so that identical timestamps still order
//! the same way on every call.

use std::cmp::Ordering;

use crate::types::Ticket;

/// Comparator for the waiting cohort
///
/// Sorting a cohort ascending with this comparator puts the next ticket
/// to call first.
pub fn waiting_order(a: &Ticket, b: &Ticket) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort a cohort into call order in place
pub fn sort_cohort(tickets: &mut [Ticket]) {
    tickets.sort_by(waiting_order);
}

/// The ticket that would be called next, without sorting the whole cohort
pub fn next_in_line(tickets: &[Ticket]) -> Option<&Ticket> {
    tickets.iter().min_by(|a, b| waiting_order(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TicketStatus;
    use chrono::{Duration, Utc};

    fn ticket(id: &str, priority: i32, seconds_ago: i64) -> Ticket {
        Ticket {
            id: id.to_string(),
            number: format!("A-{:03}", 1),
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
    fn higher_priority_comes_first() {
        let urgent = ticket("t-urgent", 5, 1);
        let normal = ticket("t-normal", 1, 600);

        let mut cohort = vec![normal.clone(), urgent.clone()];
        sort_cohort(&mut cohort);
        assert_eq!(cohort[0].id, "t-urgent");
        assert_eq!(next_in_line(&cohort).unwrap().id, "t-urgent");
    }

    #[test]
    fn equal_priority_is_fifo_at_millisecond_resolution() {
        let mut first = ticket("t-first", 1, 0);
        let mut second = ticket("t-second", 1, 0);
        let base = Utc::now();
        first.created_at = base;
        second.created_at = base + Duration::milliseconds(1);

        let cohort = vec![second.clone(), first.clone()];
        assert_eq!(next_in_line(&cohort).unwrap().id, "t-first");
    }

    #[test]
    fn identical_timestamps_order_stably_by_id() {
        let base = Utc::now();
        let mut a = ticket("t-a", 1, 0);
        let mut b = ticket("t-b", 1, 0);
        a.created_at = base;
        b.created_at = base;

        // Same winner regardless of input order
        assert_eq!(next_in_line(&[a.clone(), b.clone()]).unwrap().id, "t-a");
        assert_eq!(next_in_line(&[b, a]).unwrap().id, "t-a");
    }

    #[test]
    fn empty_cohort_has_no_next() {
        assert!(next_in_line(&[]).is_none());
    }

    #[test]
    fn sort_is_a_total_order() {
        let mut cohort = vec![
            ticket("t-1", 1, 30),
            ticket("t-2", 3, 10),
            ticket("t-3", 1, 60),
            ticket("t-4", 3, 20),
        ];
        sort_cohort(&mut cohort);
        let ids: Vec<&str> = cohort.iter().map(|t| t.id.as_str()).collect();
        // Priority 3 tickets first (older first), then priority 1
        assert_eq!(ids, vec!["t-4", "t-2", "t-3", "t-1"]);
    }
}
