use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ticketdesk_core::customers::ports::{CustomerRepository, CustomerStore};
use ticketdesk_core::customers::{generate_next_code, CodeAllocator, CustomerSyncService};
use ticketdesk_domain::{
    CalendarCustomerCandidate, Customer, CustomerCode, CustomerField, DeskError, FieldChange,
    NewCustomer, Result as DomainResult, SyncStats,
};

/// In-memory `CustomerStore`.
///
/// Mirrors the SQLite matching rules: email and name compare
/// case-insensitively, phone compares exactly.
#[derive(Default, Clone)]
pub struct MemoryCustomerStore {
    pub customers: Vec<Customer>,
    next_id: i64,
    clock: i64,
}

impl MemoryCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row with an explicit code.
    pub fn with_customer(mut self, code: &str, customer: NewCustomer) -> Self {
        let code = CustomerCode::parse(code).unwrap();
        self.insert(&code, &customer).unwrap();
        self
    }

    pub fn by_name(&self, name: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.name == name)
    }

    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }
}

impl CustomerStore for MemoryCustomerStore {
    fn max_code(&self) -> DomainResult<Option<String>> {
        Ok(self.customers.iter().map(|c| c.code.as_str().to_string()).max())
    }

    fn find_by_email(&self, email: &str) -> DomainResult<Option<Customer>> {
        Ok(self
            .customers
            .iter()
            .find(|c| c.email.as_deref().is_some_and(|e| e.to_lowercase() == email.to_lowercase()))
            .cloned())
    }

    fn find_by_phone(&self, phone: &str) -> DomainResult<Option<Customer>> {
        Ok(self.customers.iter().find(|c| c.phone.as_deref() == Some(phone)).cloned())
    }

    fn find_by_name(&self, name: &str) -> DomainResult<Option<Customer>> {
        Ok(self.customers.iter().find(|c| c.name.to_lowercase() == name.to_lowercase()).cloned())
    }

    fn insert(&mut self, code: &CustomerCode, customer: &NewCustomer) -> DomainResult<Customer> {
        if self.customers.iter().any(|c| &c.code == code) {
            return Err(DeskError::Database(format!("duplicate code {code}")));
        }
        self.next_id += 1;
        let now = self.tick();
        let row = Customer {
            id: self.next_id,
            code: code.clone(),
            name: customer.name.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
            address: customer.address.clone(),
            created_at: now,
            updated_at: now,
        };
        self.customers.push(row.clone());
        Ok(row)
    }

    fn update_fields(&mut self, id: i64, changes: &[FieldChange]) -> DomainResult<()> {
        let now = self.tick();
        let row = self
            .customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DeskError::NotFound(format!("customer {id}")))?;
        for change in changes {
            match change.field {
                CustomerField::Name => row.name = change.value.clone().unwrap_or_default(),
                CustomerField::Email => row.email = change.value.clone(),
                CustomerField::Phone => row.phone = change.value.clone(),
                CustomerField::Address => row.address = change.value.clone(),
            }
        }
        row.updated_at = now;
        Ok(())
    }
}

/// Allocator that reports an exhausted code space on selected calls
/// (1-based) and otherwise behaves like the watermark allocator.
pub struct FailingAllocator {
    fail_on: Vec<usize>,
    calls: AtomicUsize,
}

impl FailingAllocator {
    pub fn failing_on(fail_on: &[usize]) -> Self {
        Self { fail_on: fail_on.to_vec(), calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CodeAllocator for FailingAllocator {
    fn next_code(&self, store: &dyn CustomerStore) -> DomainResult<CustomerCode> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&call) {
            return Err(DeskError::CodeSpaceExhausted);
        }
        generate_next_code(store)
    }
}

/// `CustomerRepository` over a shared `MemoryCustomerStore`.
///
/// Batches run against a copy of the store that is written back only when
/// the batch succeeds, matching transaction semantics.
#[derive(Clone, Default)]
pub struct MemoryCustomerRepository {
    pub store: Arc<Mutex<MemoryCustomerStore>>,
    service: CustomerSyncService,
    pub sync_calls: Arc<AtomicUsize>,
}

impl MemoryCustomerRepository {
    pub fn new(store: MemoryCustomerStore) -> Self {
        Self { store: Arc::new(Mutex::new(store)), ..Self::default() }
    }

    pub fn snapshot(&self) -> MemoryCustomerStore {
        self.store.lock().unwrap().clone()
    }
}

#[async_trait]
impl CustomerRepository for MemoryCustomerRepository {
    async fn sync_candidates(
        &self,
        candidates: Vec<CalendarCustomerCandidate>,
    ) -> DomainResult<SyncStats> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.store.lock().unwrap();
        let mut tx = guard.clone();
        let stats = self.service.sync_candidates(&mut tx, &candidates)?;
        *guard = tx;
        Ok(stats)
    }

    async fn next_code(&self) -> DomainResult<CustomerCode> {
        generate_next_code(&*self.store.lock().unwrap())
    }

    async fn create_customer(&self, customer: NewCustomer) -> DomainResult<Customer> {
        let mut guard = self.store.lock().unwrap();
        self.service.create_customer(&mut *guard, &customer)
    }

    async fn find_by_code(&self, code: &CustomerCode) -> DomainResult<Option<Customer>> {
        Ok(self.store.lock().unwrap().customers.iter().find(|c| &c.code == code).cloned())
    }

    async fn list(&self) -> DomainResult<Vec<Customer>> {
        let mut rows = self.store.lock().unwrap().customers.clone();
        rows.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(rows)
    }

    async fn delete(&self, code: &CustomerCode) -> DomainResult<bool> {
        let mut guard = self.store.lock().unwrap();
        let before = guard.customers.len();
        guard.customers.retain(|c| &c.code != code);
        Ok(guard.customers.len() != before)
    }
}

/// Candidate with only a name and optional contact data.
pub fn candidate(
    name: &str,
    email: Option<&str>,
    phone: Option<&str>,
    address: Option<&str>,
) -> CalendarCustomerCandidate {
    CalendarCustomerCandidate {
        name: name.to_string(),
        email: email.map(str::to_string),
        phone: phone.map(str::to_string),
        address: address.map(str::to_string),
        notes: None,
        event_id: None,
    }
}
