#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;
use ticketdesk_core::{CalendarCredentialStore, CalendarCredentials, CalendarSyncRunner, SyncRequest};
use ticketdesk_domain::{CalendarCustomerCandidate, DeskError, Result, SyncDetails, SyncStats};
use ticketdesk_infra::database::DbManager;
use tokio::sync::Notify;

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a new temporary database with migrations applied.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("ticketdesk-test.db");

        let manager = DbManager::new(&db_path, 4, Duration::from_secs(5))
            .expect("db manager should be created");
        manager.run_migrations().expect("schema migrations should apply");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }

    /// Execute a batch of SQL statements against the database.
    pub fn execute_batch(&self, sql: &str) {
        let conn = self
            .manager
            .get_connection()
            .expect("connection should be available for execute_batch");
        conn.execute_batch(sql).expect("SQL batch execution should succeed");
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

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

/// Directory holding a client-secrets file and an optional token file.
pub struct CredentialFiles {
    pub dir: TempDir,
}

impl CredentialFiles {
    pub fn new() -> Self {
        Self { dir: TempDir::new().expect("temp dir should be created") }
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.dir.path().join("credentials.json")
    }

    pub fn token_path(&self) -> PathBuf {
        self.dir.path().join("tokens").join("token.json")
    }

    pub fn write_client_secrets(&self) {
        let body = json!({
            "installed": {
                "client_id": "desk-client.apps.googleusercontent.com",
                "client_secret": "desk-secret",
                "token_uri": "https://oauth2.googleapis.com/token"
            }
        });
        std::fs::write(self.credentials_path(), body.to_string())
            .expect("client secrets should be written");
    }

    pub fn write_token(&self, token: serde_json::Value) {
        let path = self.token_path();
        std::fs::create_dir_all(path.parent().expect("token path has a parent"))
            .expect("token dir should be created");
        std::fs::write(path, token.to_string()).expect("token should be written");
    }

    pub fn read_token(&self) -> serde_json::Value {
        let raw = std::fs::read_to_string(self.token_path()).expect("token should be readable");
        serde_json::from_str(&raw).expect("token should be JSON")
    }
}

/// Credential store with a fixed answer.
pub struct StaticCredentials {
    configured: bool,
}

impl StaticCredentials {
    pub fn present() -> Arc<Self> {
        Arc::new(Self { configured: true })
    }

    pub fn missing() -> Arc<Self> {
        Arc::new(Self { configured: false })
    }
}

#[async_trait]
impl CalendarCredentialStore for StaticCredentials {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn resolve(&self) -> Result<Option<CalendarCredentials>> {
        Ok(self.configured.then(|| CalendarCredentials { access_token: "static".into() }))
    }
}

/// Runner that counts calls and can be held open until released.
pub struct CountingRunner {
    calls: AtomicUsize,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
    failure: Option<DeskError>,
    panics: bool,
}

impl CountingRunner {
    pub fn instant() -> Arc<Self> {
        Arc::new(Self { calls: AtomicUsize::new(0), gate: None, failure: None, panics: false })
    }

    /// Signals `started` on entry and waits for `release` before returning.
    pub fn gated(started: Arc<Notify>, release: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            gate: Some((started, release)),
            failure: None,
            panics: false,
        })
    }

    pub fn failing(error: DeskError) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            gate: None,
            failure: Some(error),
            panics: false,
        })
    }

    /// Panics inside every run after counting the call.
    pub fn panicking() -> Arc<Self> {
        Arc::new(Self { calls: AtomicUsize::new(0), gate: None, failure: None, panics: true })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalendarSyncRunner for CountingRunner {
    async fn run_sync(&self, request: SyncRequest) -> Result<(SyncStats, SyncDetails)> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some((started, release)) = &self.gate {
            started.notify_one();
            release.notified().await;
        }

        if self.panics {
            panic!("calendar runner blew up");
        }

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let stats = SyncStats { total: 1, created: 1, updated: 0, skipped: 0 };
        let details = SyncDetails {
            calendar_id: request.calendar_id.unwrap_or_else(|| "primary".into()),
            events_count: 1,
            candidates_count: 1,
            past_days: request.past_days,
            future_days: request.future_days,
            max_results: request.max_results,
            time_min: "2025-01-01T00:00:00Z".into(),
            time_max: "2025-01-08T00:00:00Z".into(),
        };
        Ok((stats, details))
    }
}
