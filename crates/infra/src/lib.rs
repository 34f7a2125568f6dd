//! # TicketDesk Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite persistence for customers (rusqlite + r2d2)
//! - The Google Calendar HTTP client and OAuth token file handling
//! - Configuration loading from the environment and config files
//! - The periodic calendar sync scheduler
//!
//! ## Architecture
//! - Implements traits defined in `ticketdesk-core`
//! - Contains all "impure" code (I/O, network, timers)

pub mod config;
pub mod database;
pub mod errors;
pub mod integrations;
pub mod scheduling;

// Re-export commonly used items
pub use database::{DbManager, SqliteCustomerRepository, SqliteCustomerStore};
pub use errors::InfraError;
pub use integrations::calendar::{GoogleCalendarClient, TokenFileCredentialStore};
pub use scheduling::{CalendarScheduler, CalendarSchedulerConfig, TickOutcome};
