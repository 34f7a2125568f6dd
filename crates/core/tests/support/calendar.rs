use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ticketdesk_core::{CalendarCredentialStore, CalendarCredentials, CalendarSource};
use ticketdesk_domain::{
    CalendarAttendee, DeskError, RawCalendarEvent, Result as DomainResult, SyncWindow,
};

/// Credentials that are either always present or always missing.
pub struct StaticCredentials {
    token: Option<String>,
    pub resolve_calls: AtomicUsize,
}

impl StaticCredentials {
    pub fn present() -> Self {
        Self { token: Some("test-token".to_string()), resolve_calls: AtomicUsize::new(0) }
    }

    pub fn missing() -> Self {
        Self { token: None, resolve_calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl CalendarCredentialStore for StaticCredentials {
    fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    async fn resolve(&self) -> DomainResult<Option<CalendarCredentials>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.token.clone().map(|access_token| CalendarCredentials { access_token }))
    }
}

/// Recorded arguments of one `fetch_events` call.
#[derive(Debug, Clone)]
pub struct FetchCall {
    pub calendar_id: String,
    pub window: SyncWindow,
    pub max_results: usize,
}

/// In-memory `CalendarSource` returning a fixed set of events.
#[derive(Default)]
pub struct MockCalendarSource {
    events: Vec<RawCalendarEvent>,
    error: Option<DeskError>,
    pub calls: Mutex<Vec<FetchCall>>,
}

impl MockCalendarSource {
    pub fn new(events: Vec<RawCalendarEvent>) -> Self {
        Self { events, ..Self::default() }
    }

    pub fn failing(error: DeskError) -> Self {
        Self { error: Some(error), ..Self::default() }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<FetchCall> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CalendarSource for MockCalendarSource {
    async fn fetch_events(
        &self,
        _credentials: &CalendarCredentials,
        calendar_id: &str,
        window: &SyncWindow,
        max_results: usize,
    ) -> DomainResult<Vec<RawCalendarEvent>> {
        self.calls.lock().unwrap().push(FetchCall {
            calendar_id: calendar_id.to_string(),
            window: *window,
            max_results,
        });
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        Ok(self.events.iter().take(max_results).cloned().collect())
    }
}

/// Event with a summary and one attendee.
pub fn event(id: &str, summary: Option<&str>, attendee_email: Option<&str>) -> RawCalendarEvent {
    RawCalendarEvent {
        id: Some(id.to_string()),
        summary: summary.map(str::to_string),
        attendees: attendee_email
            .map(|email| {
                vec![CalendarAttendee {
                    email: Some(email.to_string()),
                    display_name: None,
                    resource: false,
                }]
            })
            .unwrap_or_default(),
        ..RawCalendarEvent::default()
    }
}
