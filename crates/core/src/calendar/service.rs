//! Calendar sync orchestration - core business logic

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ticketdesk_domain::constants::DEFAULT_CALENDAR_ID;
use ticketdesk_domain::{DeskError, Result, SyncDetails, SyncStats, SyncWindow};
use tracing::{info, instrument};

use super::extract::extract_all_candidates;
use super::ports::{CalendarCredentialStore, CalendarSource, CalendarSyncRunner, SyncRequest};
use crate::customers::ports::CustomerRepository;

/// Calendar sync service
///
/// Fetches events for a time window, turns them into customer candidates
/// and hands them to the repository for reconciliation.
pub struct CalendarSyncService {
    credentials: Arc<dyn CalendarCredentialStore>,
    source: Arc<dyn CalendarSource>,
    repository: Arc<dyn CustomerRepository>,
    default_calendar_id: String,
}

impl CalendarSyncService {
    pub fn new(
        credentials: Arc<dyn CalendarCredentialStore>,
        source: Arc<dyn CalendarSource>,
        repository: Arc<dyn CustomerRepository>,
    ) -> Self {
        Self {
            credentials,
            source,
            repository,
            default_calendar_id: DEFAULT_CALENDAR_ID.to_string(),
        }
    }

    /// Calendar used when a request does not name one.
    pub fn with_default_calendar_id(mut self, calendar_id: impl Into<String>) -> Self {
        self.default_calendar_id = calendar_id.into();
        self
    }

    /// Request value, trimmed; blank falls back to the configured default
    /// and then to `primary`.
    pub fn resolve_calendar_id(&self, requested: Option<&str>) -> String {
        [requested, Some(self.default_calendar_id.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|id| !id.is_empty())
            .unwrap_or(DEFAULT_CALENDAR_ID)
            .to_string()
    }

    /// Run a sync for the window around the current time.
    pub async fn sync(&self, request: SyncRequest) -> Result<(SyncStats, SyncDetails)> {
        self.sync_at(request, Utc::now()).await
    }

    /// Run a sync for the window around `now`.
    #[instrument(skip(self))]
    pub async fn sync_at(
        &self,
        request: SyncRequest,
        now: DateTime<Utc>,
    ) -> Result<(SyncStats, SyncDetails)> {
        let credentials = self.credentials.resolve().await?.ok_or_else(|| {
            DeskError::Config("Google Calendar credentials are not configured".to_string())
        })?;

        let past_days = request.past_days.max(0);
        let future_days = request.future_days.max(0);
        let max_results = request.max_results.max(1);
        let calendar_id = self.resolve_calendar_id(request.calendar_id.as_deref());
        let window = SyncWindow::around(now, past_days, future_days)?;

        let events = self
            .source
            .fetch_events(
                &credentials,
                &calendar_id,
                &window,
                usize::try_from(max_results).unwrap_or(usize::MAX),
            )
            .await?;
        let candidates = extract_all_candidates(&events);
        let candidates_count = candidates.len();

        let stats = self.repository.sync_candidates(candidates).await?;

        let details = SyncDetails {
            calendar_id,
            events_count: events.len(),
            candidates_count,
            past_days,
            future_days,
            max_results,
            time_min: window.time_min_rfc3339(),
            time_max: window.time_max_rfc3339(),
        };

        info!(
            calendar_id = %details.calendar_id,
            events = details.events_count,
            created = stats.created,
            updated = stats.updated,
            skipped = stats.skipped,
            "Calendar sync completed"
        );
        Ok((stats, details))
    }
}

#[async_trait]
impl CalendarSyncRunner for CalendarSyncService {
    async fn run_sync(&self, request: SyncRequest) -> Result<(SyncStats, SyncDetails)> {
        self.sync(request).await
    }
}
