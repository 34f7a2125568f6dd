//! Sequential customer code allocation
//!
//! Codes are handed out by reading the current maximum and incrementing it.
//! The read is not a reservation: callers must run it in the same
//! transaction as the insert that consumes the code.

use ticketdesk_domain::{CustomerCode, Result};

use super::ports::CustomerStore;

/// Code following `current`, or `aaaa` when nothing has been allocated.
///
/// Fails with `InvalidCode` when `current` is malformed and with
/// `CodeSpaceExhausted` after `zzzz`.
pub fn next_after(current: Option<&str>) -> Result<CustomerCode> {
    match current.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(CustomerCode::first()),
        Some(raw) => CustomerCode::parse(raw)?.next(),
    }
}

/// Read the store's maximum code and return its successor.
pub fn generate_next_code(store: &dyn CustomerStore) -> Result<CustomerCode> {
    let current = store.max_code()?;
    next_after(current.as_deref())
}

/// Strategy for choosing the code of a new customer
pub trait CodeAllocator: Send + Sync {
    fn next_code(&self, store: &dyn CustomerStore) -> Result<CustomerCode>;
}

/// Read-max-then-increment allocation.
///
/// Deleting the customer holding the top code lowers the watermark, so that
/// code is handed out again.
#[derive(Debug, Default, Clone, Copy)]
pub struct WatermarkAllocator;

impl CodeAllocator for WatermarkAllocator {
    fn next_code(&self, store: &dyn CustomerStore) -> Result<CustomerCode> {
        generate_next_code(store)
    }
}
