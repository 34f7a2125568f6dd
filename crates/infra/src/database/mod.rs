//! Database implementations

pub mod customer_repository;
pub mod manager;

pub use customer_repository::{SqliteCustomerRepository, SqliteCustomerStore};
pub use manager::{DbManager, SqliteConnection, SqlitePool};
