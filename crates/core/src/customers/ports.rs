//! Port interfaces for customer persistence
//!
//! `CustomerStore` is the transaction-scoped, synchronous view the sync
//! service works against; `CustomerRepository` is the async facade the
//! application layer calls.

use async_trait::async_trait;
use ticketdesk_domain::{
    CalendarCustomerCandidate, Customer, CustomerCode, FieldChange, NewCustomer, Result, SyncStats,
};

/// Customer table access inside a single open transaction.
///
/// Implementations must give read-after-write visibility: a row inserted
/// earlier in the batch is returned by later lookups.
pub trait CustomerStore {
    /// Greatest non-empty stored code, undecoded.
    fn max_code(&self) -> Result<Option<String>>;

    /// Case-insensitive exact email match.
    fn find_by_email(&self, email: &str) -> Result<Option<Customer>>;

    /// Exact phone match.
    fn find_by_phone(&self, phone: &str) -> Result<Option<Customer>>;

    /// Case-insensitive exact name match.
    fn find_by_name(&self, name: &str) -> Result<Option<Customer>>;

    fn insert(&mut self, code: &CustomerCode, customer: &NewCustomer) -> Result<Customer>;

    /// Overwrite the given columns and bump `updated_at`. Never touches
    /// `code`.
    fn update_fields(&mut self, id: i64, changes: &[FieldChange]) -> Result<()>;
}

/// Application-facing customer repository
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Reconcile a batch of candidates in one transaction.
    async fn sync_candidates(&self, candidates: Vec<CalendarCustomerCandidate>)
        -> Result<SyncStats>;

    /// Code the next created customer would receive.
    async fn next_code(&self) -> Result<CustomerCode>;

    /// Allocate a code and insert in one transaction.
    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer>;

    async fn find_by_code(&self, code: &CustomerCode) -> Result<Option<Customer>>;

    /// All customers ordered by code.
    async fn list(&self) -> Result<Vec<Customer>>;

    /// Returns whether a row was removed.
    async fn delete(&self, code: &CustomerCode) -> Result<bool>;
}
