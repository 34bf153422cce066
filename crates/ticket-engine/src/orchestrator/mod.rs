//! # Ticketing Orchestration
//!
//! The [`TicketingEngine`](core::TicketingEngine) coordinates every ticket
//! operation: creation and numbering, queue ordering, lifecycle
//! transitions, position estimates, and dashboard aggregations. The API
//! facades and REST surface are thin wrappers over it.

pub mod core;

pub use core::{ServingTicket, TicketingEngine};
