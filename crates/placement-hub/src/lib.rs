//! Opportunity matching and application lifecycle core for a campus internship portal.
//!
//! The host owns rendering, authentication and persistence. This crate owns the
//! recommendation rule, the application state machine, and the catalog contract
//! both operate over.

pub mod clock;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
