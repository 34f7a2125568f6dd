//! Google Calendar v3 events client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use ticketdesk_core::{CalendarCredentials, CalendarSource};
use ticketdesk_domain::{DeskError, RawCalendarEvent, Result, SyncWindow};
use tracing::{debug, instrument};
use url::Url;

use crate::errors::InfraError;

pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Largest page the events endpoint accepts.
const MAX_PAGE_SIZE: usize = 2500;

/// Reads events from the Google Calendar REST API.
#[derive(Clone)]
pub struct GoogleCalendarClient {
    http: Client,
    base_url: String,
}

impl GoogleCalendarClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(timeout, GOOGLE_CALENDAR_API_BASE)
    }

    /// Point the client at another API root (tests, proxies).
    pub fn with_base_url(timeout: Duration, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build().map_err(InfraError::from)?;
        Ok(Self { http, base_url: base_url.into() })
    }

    fn events_url(&self, calendar_id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            DeskError::Config(format!("invalid calendar API base URL '{}': {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                DeskError::Config(format!("calendar API base URL '{}' cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .push("calendars")
            .push(calendar_id)
            .push("events");
        Ok(url)
    }

    async fn fetch_page(
        &self,
        url: &Url,
        credentials: &CalendarCredentials,
        query: &[(&str, String)],
    ) -> Result<GoogleEventsResponse> {
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&credentials.access_token)
            .query(query)
            .send()
            .await
            .map_err(InfraError::from)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(DeskError::Auth(format!("Google Calendar rejected credentials ({status}): {body}")));
        }

        let response = response.error_for_status().map_err(InfraError::from)?;
        let page = response.json::<GoogleEventsResponse>().await.map_err(InfraError::from)?;
        Ok(page)
    }
}

#[async_trait]
impl CalendarSource for GoogleCalendarClient {
    #[instrument(skip(self, credentials, window))]
    async fn fetch_events(
        &self,
        credentials: &CalendarCredentials,
        calendar_id: &str,
        window: &SyncWindow,
        max_results: usize,
    ) -> Result<Vec<RawCalendarEvent>> {
        let url = self.events_url(calendar_id)?;
        let mut events: Vec<RawCalendarEvent> = Vec::new();
        let mut page_token: Option<String> = None;

        while events.len() < max_results {
            let page_size = (max_results - events.len()).min(MAX_PAGE_SIZE);
            let mut query = vec![
                ("timeMin", window.time_min_rfc3339()),
                ("timeMax", window.time_max_rfc3339()),
                ("maxResults", page_size.to_string()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let page = self.fetch_page(&url, credentials, &query).await?;
            debug!(items = page.items.len(), has_more = page.next_page_token.is_some(), "Fetched events page");

            events.extend(page.items);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        events.truncate(max_results);
        Ok(events)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventsResponse {
    #[serde(default)]
    items: Vec<RawCalendarEvent>,
    next_page_token: Option<String>,
}
