//! # Queue Ordering, Position Estimation and Statistics
//!
//! Pure functions over ticket snapshots. The orchestrator fetches the
//! relevant tickets from the store and hands them to this module; nothing
//! here touches storage, which keeps the ordering logic trivially
//! testable and guarantees every computation sees one consistent
//! snapshot.
//!
//! - [`ordering`]: the waiting-cohort total order and "who is next"
//! - [`position`]: a customer's 1-based place in line and wait estimate
//! - [`stats`]: daily counts, average durations, peak hours, staff
//!   performance

pub mod ordering;
pub mod position;
pub mod stats;

pub use ordering::{next_in_line, sort_cohort, waiting_order};
pub use position::QueuePosition;
pub use stats::{QueueStatistics, StaffPerformance};
