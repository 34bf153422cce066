//! # Live Monitoring
//!
//! Real-time ticket event fan-out for boards, polling clients, and
//! notification layers. Delivery is best-effort: a slow or absent
//! subscriber never blocks or fails a ticket mutation.

pub mod events;

pub use events::{TicketEvent, TicketEventBus, TicketEventKind};
