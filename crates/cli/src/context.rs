//! Application context - dependency wiring for every command

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use ticketdesk_core::{CalendarCredentialStore, CalendarSyncService, CustomerRepository};
use ticketdesk_domain::Config;
use ticketdesk_infra::integrations::calendar::{GoogleCalendarClient, TokenFileCredentialStore};
use ticketdesk_infra::{config, DbManager, SqliteCustomerRepository};
use tracing::{info, warn};

/// Resolve configuration: an explicit file wins, then the environment and
/// probed files, then built-in defaults.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    if let Some(path) = path {
        let display = path.display().to_string();
        return config::load_from_file(Some(path))
            .with_context(|| format!("failed to load config file {display}"));
    }

    match config::load() {
        Ok(config) => Ok(config),
        Err(err) => {
            warn!(error = %err, "No configuration found, using defaults");
            Ok(Config::default())
        }
    }
}

/// Holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub customers: Arc<SqliteCustomerRepository>,
}

impl AppContext {
    /// Open the database and make sure the schema exists.
    pub fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::from_config(&config.database).with_context(|| {
            format!("failed to open database {}", config.database.path)
        })?);
        db.run_migrations().context("failed to apply database schema")?;
        info!(db_path = %db.path().display(), "Database ready");

        let customers = Arc::new(SqliteCustomerRepository::new(Arc::clone(&db)));
        Ok(Self { config, db, customers })
    }

    pub fn credentials(&self) -> Result<Arc<dyn CalendarCredentialStore>> {
        let store = TokenFileCredentialStore::from_config(&self.config.calendar)
            .context("failed to build calendar credential store")?;
        Ok(Arc::new(store))
    }

    /// Calendar sync service wired to Google Calendar and the customer table.
    pub fn calendar_sync(
        &self,
        credentials: Arc<dyn CalendarCredentialStore>,
    ) -> Result<Arc<CalendarSyncService>> {
        let calendar = &self.config.calendar;
        let source = match calendar.api_base_url.as_deref() {
            Some(base) => GoogleCalendarClient::with_base_url(calendar.http_timeout(), base),
            None => GoogleCalendarClient::new(calendar.http_timeout()),
        }
        .context("failed to build calendar client")?;

        let repository: Arc<dyn CustomerRepository> = self.customers.clone();
        let service = CalendarSyncService::new(credentials, Arc::new(source), repository)
            .with_default_calendar_id(calendar.default_calendar_id());
        Ok(Arc::new(service))
    }
}
