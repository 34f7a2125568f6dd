//! Calendar integration port interfaces

use std::fmt;

use async_trait::async_trait;
use ticketdesk_domain::constants::{DEFAULT_FUTURE_DAYS, DEFAULT_MAX_RESULTS, DEFAULT_PAST_DAYS};
use ticketdesk_domain::{CalendarConfig, RawCalendarEvent, Result, SyncDetails, SyncStats, SyncWindow};

/// Access token usable against the calendar provider
#[derive(Clone, PartialEq, Eq)]
pub struct CalendarCredentials {
    pub access_token: String,
}

impl fmt::Debug for CalendarCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarCredentials").field("access_token", &"<redacted>").finish()
    }
}

/// Source of calendar credentials
#[async_trait]
pub trait CalendarCredentialStore: Send + Sync {
    /// Whether calendar access has been set up at all. Cheap; no I/O beyond
    /// a file existence check.
    fn is_configured(&self) -> bool;

    /// Usable credentials, refreshing them when needed. `Ok(None)` means
    /// calendar access is not configured.
    async fn resolve(&self) -> Result<Option<CalendarCredentials>>;
}

/// Trait for calendar provider operations
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Fetch up to `max_results` events inside `window`, ordered by start
    /// time with recurring events expanded.
    async fn fetch_events(
        &self,
        credentials: &CalendarCredentials,
        calendar_id: &str,
        window: &SyncWindow,
        max_results: usize,
    ) -> Result<Vec<RawCalendarEvent>>;
}

/// Parameters of one sync run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// Explicit calendar; blank or absent uses the configured default.
    pub calendar_id: Option<String>,
    pub past_days: i64,
    pub future_days: i64,
    pub max_results: i64,
}

impl Default for SyncRequest {
    fn default() -> Self {
        Self {
            calendar_id: None,
            past_days: DEFAULT_PAST_DAYS,
            future_days: DEFAULT_FUTURE_DAYS,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl From<&CalendarConfig> for SyncRequest {
    fn from(config: &CalendarConfig) -> Self {
        Self {
            calendar_id: Some(config.calendar_id.clone()),
            past_days: config.past_days,
            future_days: config.future_days,
            max_results: config.max_results,
        }
    }
}

/// Anything able to run a full calendar sync; the scheduler drives this.
#[async_trait]
pub trait CalendarSyncRunner: Send + Sync {
    async fn run_sync(&self, request: SyncRequest) -> Result<(SyncStats, SyncDetails)>;
}
