//! # TicketDesk Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Customer code allocation and reconciliation rules
//! - Calendar candidate extraction and sync orchestration
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `ticketdesk-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod calendar;
pub mod customers;

// Re-export specific items to avoid ambiguity
pub use calendar::ports::{
    CalendarCredentialStore, CalendarCredentials, CalendarSource, CalendarSyncRunner, SyncRequest,
};
pub use calendar::CalendarSyncService;
pub use customers::ports::{CustomerRepository, CustomerStore};
pub use customers::{CodeAllocator, CustomerSyncService, WatermarkAllocator};
