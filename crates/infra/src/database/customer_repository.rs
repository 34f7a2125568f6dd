//! Customer persistence on SQLite
//!
//! `SqliteCustomerStore` is the synchronous, transaction-scoped store the
//! reconciliation service runs against. `SqliteCustomerRepository` wraps it
//! for async callers: every write operation runs on the blocking pool inside
//! one immediate transaction that is committed only when the whole operation
//! succeeds.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use ticketdesk_core::{CustomerRepository, CustomerStore, CustomerSyncService};
use ticketdesk_domain::{
    CalendarCustomerCandidate, Customer, CustomerCode, DeskError, FieldChange, NewCustomer,
    Result as DomainResult, SyncStats,
};
use tokio::task::{self, JoinError};
use tracing::{debug, instrument};

use super::manager::{map_sql_error, DbManager};

const CUSTOMER_COLUMNS: &str = "id, code, name, email, phone, address, created_at, updated_at";

/* -------------------------------------------------------------------------- */
/* Transaction-scoped store */
/* -------------------------------------------------------------------------- */

/// `CustomerStore` over an open connection or transaction.
pub struct SqliteCustomerStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteCustomerStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn find_one(&self, predicate: &str, value: &str) -> DomainResult<Option<Customer>> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE {predicate} ORDER BY id LIMIT 1"
        );
        let row = self
            .conn
            .query_row(&sql, params![value], map_customer_row)
            .optional()
            .map_err(map_sql_error)?;
        row.map(CustomerRow::into_customer).transpose()
    }
}

impl CustomerStore for SqliteCustomerStore<'_> {
    fn max_code(&self) -> DomainResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT MAX(code) FROM customers WHERE code IS NOT NULL AND code != ''",
                [],
                |row| row.get::<_, Option<String>>(0),
            )
            .map_err(map_sql_error)
    }

    fn find_by_email(&self, email: &str) -> DomainResult<Option<Customer>> {
        self.find_one("LOWER(email) = LOWER(?1)", email)
    }

    fn find_by_phone(&self, phone: &str) -> DomainResult<Option<Customer>> {
        self.find_one("phone = ?1", phone)
    }

    fn find_by_name(&self, name: &str) -> DomainResult<Option<Customer>> {
        self.find_one("LOWER(name) = LOWER(?1)", name)
    }

    fn insert(&mut self, code: &CustomerCode, customer: &NewCustomer) -> DomainResult<Customer> {
        let now = Utc::now().timestamp();
        self.conn
            .execute(
                "INSERT INTO customers (code, name, email, phone, address, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    code.as_str(),
                    &customer.name,
                    &customer.email,
                    &customer.phone,
                    &customer.address,
                    now
                ],
            )
            .map_err(map_sql_error)?;

        Ok(Customer {
            id: self.conn.last_insert_rowid(),
            code: code.clone(),
            name: customer.name.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
            address: customer.address.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    fn update_fields(&mut self, id: i64, changes: &[FieldChange]) -> DomainResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let assignments: Vec<String> = changes
            .iter()
            .enumerate()
            .map(|(idx, change)| format!("{} = ?{}", change.field.column(), idx + 1))
            .collect();
        let sql = format!(
            "UPDATE customers SET {}, updated_at = ?{} WHERE id = ?{}",
            assignments.join(", "),
            changes.len() + 1,
            changes.len() + 2
        );

        let mut values: Vec<Value> =
            changes.iter().map(|change| Value::from(change.value.clone())).collect();
        values.push(Value::Integer(Utc::now().timestamp()));
        values.push(Value::Integer(id));

        let affected = self.conn.execute(&sql, params_from_iter(values)).map_err(map_sql_error)?;
        if affected == 0 {
            return Err(DeskError::NotFound(format!("customer {id} not found")));
        }
        Ok(())
    }
}

/// Raw row; the code is validated on conversion.
struct CustomerRow {
    id: i64,
    code: String,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl CustomerRow {
    fn into_customer(self) -> DomainResult<Customer> {
        Ok(Customer {
            id: self.id,
            code: CustomerCode::parse(&self.code)?,
            name: self.name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn map_customer_row(row: &Row<'_>) -> rusqlite::Result<CustomerRow> {
    Ok(CustomerRow {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/* -------------------------------------------------------------------------- */
/* Async repository */
/* -------------------------------------------------------------------------- */

/// SQLite-backed implementation of `CustomerRepository`
pub struct SqliteCustomerRepository {
    db: Arc<DbManager>,
    service: CustomerSyncService,
}

impl SqliteCustomerRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self::with_service(db, CustomerSyncService::default())
    }

    /// Use a custom reconciliation service (e.g. another code allocator).
    pub fn with_service(db: Arc<DbManager>, service: CustomerSyncService) -> Self {
        Self { db, service }
    }

    /// Run `op` inside an immediate transaction on the blocking pool.
    ///
    /// The write lock is taken up front so two concurrent batches cannot read
    /// the same code watermark.
    async fn in_transaction<T, F>(&self, op: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteCustomerStore<'_>) -> DomainResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<T> {
            let mut conn = db.get_connection()?;
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(map_sql_error)?;

            let output = {
                let mut store = SqliteCustomerStore::new(&tx);
                op(&mut store)?
            };

            tx.commit().map_err(map_sql_error)?;
            Ok(output)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn read<T, F>(&self, op: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> DomainResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<T> {
            let conn = db.get_connection()?;
            op(&conn)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl CustomerRepository for SqliteCustomerRepository {
    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    async fn sync_candidates(
        &self,
        candidates: Vec<CalendarCustomerCandidate>,
    ) -> DomainResult<SyncStats> {
        let service = self.service.clone();
        let stats = self
            .in_transaction(move |store| service.sync_candidates(store, &candidates))
            .await?;
        debug!(total = stats.total, "Customer batch committed");
        Ok(stats)
    }

    async fn next_code(&self) -> DomainResult<CustomerCode> {
        let service = self.service.clone();
        self.read(move |conn| service.next_code(&SqliteCustomerStore::new(conn))).await
    }

    #[instrument(skip(self, customer))]
    async fn create_customer(&self, customer: NewCustomer) -> DomainResult<Customer> {
        let service = self.service.clone();
        self.in_transaction(move |store| service.create_customer(store, &customer)).await
    }

    async fn find_by_code(&self, code: &CustomerCode) -> DomainResult<Option<Customer>> {
        let code = code.as_str().to_string();
        self.read(move |conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE code = ?1"),
                    params![&code],
                    map_customer_row,
                )
                .optional()
                .map_err(map_sql_error)?;
            row.map(CustomerRow::into_customer).transpose()
        })
        .await
    }

    async fn list(&self) -> DomainResult<Vec<Customer>> {
        self.read(|conn| {
            let mut stmt = conn
                .prepare(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY code"))
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map([], map_customer_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            rows.into_iter().map(CustomerRow::into_customer).collect()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete(&self, code: &CustomerCode) -> DomainResult<bool> {
        let code = code.as_str().to_string();
        self.in_transaction(move |store| {
            let affected = store
                .conn
                .execute("DELETE FROM customers WHERE code = ?1", params![&code])
                .map_err(map_sql_error)?;
            Ok(affected > 0)
        })
        .await
    }
}

fn map_join_error(err: JoinError) -> DeskError {
    if err.is_cancelled() {
        DeskError::Internal("blocking task cancelled".into())
    } else {
        DeskError::Internal(format!("blocking task panicked: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use ticketdesk_domain::CustomerField;

    use super::*;

    fn open() -> (TempDir, DbManager) {
        let dir = TempDir::new().unwrap();
        let db =
            DbManager::new(dir.path().join("customers.db"), 1, std::time::Duration::from_secs(1))
                .unwrap();
        db.run_migrations().unwrap();
        (dir, db)
    }

    fn new_customer(name: &str, email: Option<&str>, phone: Option<&str>) -> NewCustomer {
        NewCustomer::normalized(name, email, phone, None)
    }

    #[test]
    fn empty_table_has_no_max_code() {
        let (_dir, db) = open();
        let conn = db.get_connection().unwrap();
        assert_eq!(SqliteCustomerStore::new(&conn).max_code().unwrap(), None);
    }

    #[test]
    fn lookups_ignore_case_for_email_and_name() {
        let (_dir, db) = open();
        let conn = db.get_connection().unwrap();
        let mut store = SqliteCustomerStore::new(&conn);

        let code = CustomerCode::first();
        store
            .insert(&code, &new_customer("Mario Rossi", Some("Mario@Example.com"), Some("+39 333")))
            .unwrap();

        assert!(store.find_by_email("mario@example.com").unwrap().is_some());
        assert!(store.find_by_name("MARIO ROSSI").unwrap().is_some());
        assert!(store.find_by_phone("+39 333").unwrap().is_some());
        assert!(store.find_by_phone("+39333").unwrap().is_none());
        assert_eq!(store.max_code().unwrap().as_deref(), Some("aaaa"));
    }

    #[test]
    fn update_fields_touches_only_listed_columns() {
        let (_dir, db) = open();
        let conn = db.get_connection().unwrap();
        let mut store = SqliteCustomerStore::new(&conn);

        let created = store
            .insert(&CustomerCode::first(), &new_customer("Anna", Some("anna@example.com"), None))
            .unwrap();
        store
            .update_fields(
                created.id,
                &[FieldChange { field: CustomerField::Phone, value: Some("555".into()) }],
            )
            .unwrap();

        let reloaded = store.find_by_email("anna@example.com").unwrap().unwrap();
        assert_eq!(reloaded.phone.as_deref(), Some("555"));
        assert_eq!(reloaded.name, "Anna");
        assert_eq!(reloaded.code, created.code);
    }

    #[test]
    fn update_of_missing_row_is_not_found() {
        let (_dir, db) = open();
        let conn = db.get_connection().unwrap();
        let mut store = SqliteCustomerStore::new(&conn);

        let err = store
            .update_fields(42, &[FieldChange { field: CustomerField::Email, value: None }])
            .unwrap_err();
        assert!(matches!(err, DeskError::NotFound(_)));
    }

    #[test]
    fn corrupt_code_surfaces_as_invalid_code() {
        let (_dir, db) = open();
        let conn = db.get_connection().unwrap();
        conn.execute(
            "INSERT INTO customers (code, name, created_at, updated_at) VALUES ('ab1', 'Broken', 0, 0)",
            [],
        )
        .unwrap();

        let err = SqliteCustomerStore::new(&conn).find_by_name("broken").unwrap_err();
        assert!(matches!(err, DeskError::InvalidCode(code) if code == "ab1"));
    }
}
