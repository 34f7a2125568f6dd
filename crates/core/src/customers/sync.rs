//! Customer reconciliation - core business logic
//!
//! Matches calendar candidates against stored customers and decides, per
//! candidate, whether to create, update or leave the record alone.

use std::sync::Arc;

use ticketdesk_domain::{
    CalendarCustomerCandidate, Customer, CustomerCode, CustomerField, DeskError, FieldChange,
    NewCustomer, Result, SyncStats,
};
use tracing::{debug, error, info};

use super::codes::{CodeAllocator, WatermarkAllocator};
use super::ports::CustomerStore;

/// Customer sync service
///
/// Stateless apart from the allocator; every call works on the store handed
/// in, which owns the surrounding transaction.
#[derive(Clone)]
pub struct CustomerSyncService {
    allocator: Arc<dyn CodeAllocator>,
}

impl Default for CustomerSyncService {
    fn default() -> Self {
        Self::new(Arc::new(WatermarkAllocator))
    }
}

impl CustomerSyncService {
    pub fn new(allocator: Arc<dyn CodeAllocator>) -> Self {
        Self { allocator }
    }

    /// Reconcile `candidates` in order.
    ///
    /// Candidates whose name is blank are dropped before processing and are
    /// not counted. An exhausted code space turns into a skip for that
    /// candidate; any other error aborts the batch and is returned so the
    /// caller can roll back.
    pub fn sync_candidates(
        &self,
        store: &mut dyn CustomerStore,
        candidates: &[CalendarCustomerCandidate],
    ) -> Result<SyncStats> {
        let mut stats = SyncStats::default();

        let customers = candidates
            .iter()
            .map(CalendarCustomerCandidate::to_new_customer)
            .filter(|customer| !customer.name.is_empty());

        for customer in customers {
            match find_existing(store, &customer)? {
                None => match self.allocator.next_code(store) {
                    Ok(code) => {
                        store.insert(&code, &customer)?;
                        stats.record_created();
                        info!(code = %code, name = %customer.name, "Created customer from calendar");
                    }
                    Err(DeskError::CodeSpaceExhausted) => {
                        error!(name = %customer.name, "Cannot allocate customer code: code space exhausted");
                        stats.record_skipped();
                    }
                    Err(err) => return Err(err),
                },
                Some(existing) => {
                    let changes = diff_fields(&existing, &customer);
                    if changes.is_empty() {
                        stats.record_skipped();
                        continue;
                    }

                    store.update_fields(existing.id, &changes)?;
                    stats.record_updated();
                    info!(
                        code = %existing.code,
                        name = %customer.name,
                        fields = changes.len(),
                        "Updated customer from calendar"
                    );
                }
            }
        }

        debug!(
            total = stats.total,
            created = stats.created,
            updated = stats.updated,
            skipped = stats.skipped,
            "Customer batch reconciled"
        );
        Ok(stats)
    }

    /// Code the allocator would hand to the next created customer.
    pub fn next_code(&self, store: &dyn CustomerStore) -> Result<CustomerCode> {
        self.allocator.next_code(store)
    }

    /// Allocate a code and insert a customer entered by hand.
    pub fn create_customer(
        &self,
        store: &mut dyn CustomerStore,
        customer: &NewCustomer,
    ) -> Result<Customer> {
        if customer.name.trim().is_empty() {
            return Err(DeskError::InvalidInput("customer name is required".to_string()));
        }

        let code = self.allocator.next_code(store)?;
        let created = store.insert(&code, customer)?;
        info!(code = %created.code, name = %created.name, "Created customer");
        Ok(created)
    }
}

/// First match wins: email, then phone, then name.
fn find_existing(store: &dyn CustomerStore, customer: &NewCustomer) -> Result<Option<Customer>> {
    if let Some(email) = customer.email.as_deref() {
        if let Some(found) = store.find_by_email(email)? {
            return Ok(Some(found));
        }
    }
    if let Some(phone) = customer.phone.as_deref() {
        if let Some(found) = store.find_by_phone(phone)? {
            return Ok(Some(found));
        }
    }
    store.find_by_name(&customer.name)
}

/// Columns whose trimmed values differ. A missing value compares equal to an
/// empty one; a changed column takes the incoming value, absent included.
pub fn diff_fields(existing: &Customer, incoming: &NewCustomer) -> Vec<FieldChange> {
    CustomerField::ALL
        .into_iter()
        .filter(|field| {
            let old = existing.field(*field).unwrap_or_default().trim();
            let new = incoming.field(*field).unwrap_or_default().trim();
            old != new
        })
        .map(|field| FieldChange { field, value: incoming.field(field).map(str::to_string) })
        .collect()
}
