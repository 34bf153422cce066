//! # Public APIs
//!
//! Three role-scoped facades over the engine plus the REST surface:
//!
//! - [`AdminApi`]: directory management (organizations, branches,
//!   services, staff)
//! - [`TicketClient`]: customer-side operations (take a ticket, check
//!   position, cancel)
//! - [`SupervisorApi`]: dashboards, reports and exports
//! - [`rest`]: the axum router that exposes all of the above over HTTP
//!
//! The facades hold an `Arc<TicketingEngine>` and add no state of their
//! own; they exist so callers depend on the slice of the engine their
//! role needs.

pub mod admin;
pub mod client;
pub mod rest;
pub mod supervisor;

pub use admin::AdminApi;
pub use client::TicketClient;
pub use supervisor::SupervisorApi;
