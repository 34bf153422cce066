//! Daily statistics over ticket history
//!
//! All aggregations degrade to zeros over empty input; dashboards never
//! see an error from a quiet day. Durations are whole minutes,
//! `floor(milliseconds / 60000)` per ticket, with averages rounded to the
//! nearest minute.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::Serialize;

use crate::types::{Ticket, TicketStatus};

/// Snapshot of one day's queue activity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatistics {
    pub total: usize,
    pub waiting: usize,
    pub called: usize,
    pub serving: usize,
    pub completed: usize,
    pub no_show: usize,
    pub cancelled: usize,
    /// `waiting + called + serving`
    pub active: usize,
    /// Mean minutes from creation to first call, over completed tickets
    pub avg_wait_time: i64,
    /// Mean minutes from service start to completion, over completed tickets
    pub avg_service_time: i64,
    /// `round(completed / total × 100)`, 0 for an empty day
    pub completion_rate: i64,
}

/// One staff member's day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffPerformance {
    pub total: usize,
    pub completed: usize,
    pub no_show: usize,
    pub avg_service_time: i64,
    /// `round(completed / total × 100)`, 0 when the staff had no tickets
    pub efficiency: i64,
}

/// Whole minutes between two instants, truncated
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_milliseconds() / 60_000
}

fn rounded_mean(values: &[i64]) -> i64 {
    if values.is_empty() {
        return 0;
    }
    let sum: i64 = values.iter().sum();
    (sum as f64 / values.len() as f64).round() as i64
}

fn rounded_percent(part: usize, whole: usize) -> i64 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as i64
}

/// Minutes the customer waited before being called
///
/// `called_at` normally precedes `served_at`; tickets served straight
/// from `waiting` have no `called_at` and fall back to `served_at`.
fn wait_minutes(ticket: &Ticket) -> Option<i64> {
    let first_attention = ticket.called_at.or(ticket.served_at)?;
    Some(minutes_between(ticket.created_at, first_attention))
}

/// Minutes spent at the counter
fn service_minutes(ticket: &Ticket) -> Option<i64> {
    let start = ticket.served_at.or(ticket.called_at)?;
    let end = ticket.completed_at?;
    Some(minutes_between(start, end))
}

/// Aggregate a day's tickets into dashboard statistics
pub fn compute_statistics(tickets: &[Ticket]) -> QueueStatistics {
    let count = |status: TicketStatus| tickets.iter().filter(|t| t.status == status).count();

    let waiting = count(TicketStatus::Waiting);
    let called = count(TicketStatus::Called);
    let serving = count(TicketStatus::Serving);
    let completed = count(TicketStatus::Completed);

    let completed_tickets: Vec<&Ticket> = tickets
        .iter()
        .filter(|t| t.status == TicketStatus::Completed && t.completed_at.is_some())
        .collect();
    let wait_times: Vec<i64> = completed_tickets.iter().filter_map(|t| wait_minutes(t)).collect();
    let service_times: Vec<i64> = completed_tickets
        .iter()
        .filter_map(|t| service_minutes(t))
        .collect();

    QueueStatistics {
        total: tickets.len(),
        waiting,
        called,
        serving,
        completed,
        no_show: count(TicketStatus::NoShow),
        cancelled: count(TicketStatus::Cancelled),
        active: waiting + called + serving,
        avg_wait_time: rounded_mean(&wait_times),
        avg_service_time: rounded_mean(&service_times),
        completion_rate: rounded_percent(completed, tickets.len()),
    }
}

/// Tickets created per hour of the service-clock day, 24 buckets
pub fn peak_hours(tickets: &[Ticket], timezone_offset_minutes: i32) -> [usize; 24] {
    let mut buckets = [0usize; 24];
    for ticket in tickets {
        let local = ticket.created_at + Duration::minutes(timezone_offset_minutes as i64);
        buckets[local.hour() as usize] += 1;
    }
    buckets
}

/// Aggregate one staff member's tickets for a day
///
/// `tickets` must already be filtered to the staff member and day.
pub fn compute_staff_performance(tickets: &[Ticket]) -> StaffPerformance {
    let completed_tickets: Vec<&Ticket> = tickets
        .iter()
        .filter(|t| t.status == TicketStatus::Completed)
        .collect();
    let service_times: Vec<i64> = completed_tickets
        .iter()
        .filter_map(|t| service_minutes(t))
        .collect();

    StaffPerformance {
        total: tickets.len(),
        completed: completed_tickets.len(),
        no_show: tickets
            .iter()
            .filter(|t| t.status == TicketStatus::NoShow)
            .count(),
        avg_service_time: rounded_mean(&service_times),
        efficiency: rounded_percent(completed_tickets.len(), tickets.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ticket(status: TicketStatus) -> Ticket {
        Ticket {
            id: Ticket::new_id(),
            number: "A-001".to_string(),
            branch_id: "branch-1".to_string(),
            service_id: "service-1".to_string(),
            staff_id: None,
            status,
            priority: 1,
            created_at: Utc::now(),
            called_at: None,
            served_at: None,
            completed_at: None,
            estimated_wait_time: 0,
            notes: String::new(),
        }
    }

    fn completed_ticket(wait_min: i64, service_min: i64) -> Ticket {
        let created = Utc::now() - Duration::minutes(wait_min + service_min);
        let called = created + Duration::minutes(wait_min);
        let mut t = ticket(TicketStatus::Completed);
        t.created_at = created;
        t.called_at = Some(called);
        t.served_at = Some(called);
        t.completed_at = Some(called + Duration::minutes(service_min));
        t
    }

    #[test]
    fn empty_day_is_all_zeros() {
        let stats = compute_statistics(&[]);
        assert_eq!(stats, QueueStatistics::default());
        assert_eq!(stats.completion_rate, 0);
    }

    #[test]
    fn counts_and_active() {
        let tickets = vec![
            ticket(TicketStatus::Waiting),
            ticket(TicketStatus::Waiting),
            ticket(TicketStatus::Called),
            ticket(TicketStatus::Serving),
            ticket(TicketStatus::Cancelled),
            completed_ticket(10, 5),
        ];
        let stats = compute_statistics(&tickets);
        assert_eq!(stats.total, 6);
        assert_eq!(stats.waiting, 2);
        assert_eq!(stats.called, 1);
        assert_eq!(stats.serving, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.active, 4);
        // 1 of 6 completed
        assert_eq!(stats.completion_rate, 17);
    }

    #[test]
    fn average_durations_over_completed_only() {
        let tickets = vec![
            completed_ticket(10, 4),
            completed_ticket(20, 8),
            ticket(TicketStatus::Waiting),
        ];
        let stats = compute_statistics(&tickets);
        assert_eq!(stats.avg_wait_time, 15);
        assert_eq!(stats.avg_service_time, 6);
    }

    #[test]
    fn minutes_truncate_sub_minute_remainders() {
        let start = Utc::now();
        assert_eq!(minutes_between(start, start + Duration::seconds(119)), 1);
        assert_eq!(minutes_between(start, start + Duration::seconds(59)), 0);
    }

    #[test]
    fn peak_hours_bucket_by_service_clock() {
        let mut t = ticket(TicketStatus::Waiting);
        t.created_at = Utc::now()
            .date_naive()
            .and_hms_opt(23, 30, 0)
            .unwrap()
            .and_utc();

        let utc_buckets = peak_hours(std::slice::from_ref(&t), 0);
        assert_eq!(utc_buckets[23], 1);

        // +60 minutes rolls the ticket into hour 0 of the next day
        let shifted = peak_hours(std::slice::from_ref(&t), 60);
        assert_eq!(shifted[0], 1);
        assert_eq!(shifted[23], 0);
    }

    #[test]
    fn staff_performance_efficiency() {
        let tickets = vec![
            completed_ticket(5, 10),
            completed_ticket(5, 20),
            ticket(TicketStatus::NoShow),
        ];
        let perf = compute_staff_performance(&tickets);
        assert_eq!(perf.total, 3);
        assert_eq!(perf.completed, 2);
        assert_eq!(perf.no_show, 1);
        assert_eq!(perf.avg_service_time, 15);
        assert_eq!(perf.efficiency, 67);
    }

    #[test]
    fn staff_performance_over_no_tickets() {
        let perf = compute_staff_performance(&[]);
        assert_eq!(perf, StaffPerformance::default());
    }
}
