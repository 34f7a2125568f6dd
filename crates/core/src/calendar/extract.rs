//! Calendar event to customer candidate extraction
//!
//! Name comes from the event summary or an attendee display name. Contact
//! fields come from attendees first and then from `label: value` lines in
//! the event description, for example:
//!
//! ```text
//! Telefono: 333 1234567
//! Email = mario@example.com
//! Indirizzo - Via Roma 1, Milano
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use ticketdesk_domain::{non_blank, CalendarCustomerCandidate, RawCalendarEvent};
use tracing::{debug, info};

lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        compile(r"(?i)email\s*[:=-]\s*(?P<value>[^\n]+)");
    static ref PHONE_PATTERN: Regex =
        compile(r"(?i)(?:telefono|tel|phone)\s*[:=-]\s*(?P<value>[^\n]+)");
    static ref ADDRESS_PATTERN: Regex =
        compile(r"(?i)(?:indirizzo|address)\s*[:=-]\s*(?P<value>[^\n]+)");
}

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("description pattern is a valid regex")
}

/// Contact fields found in an event description
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DescriptionFields {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Scan a description for email, phone and address lines.
///
/// Each label is searched independently; the first match wins and a match
/// whose value is blank counts as no match.
pub fn parse_description(description: &str) -> DescriptionFields {
    DescriptionFields {
        email: first_value(&EMAIL_PATTERN, description),
        phone: first_value(&PHONE_PATTERN, description),
        address: first_value(&ADDRESS_PATTERN, description),
    }
}

fn first_value(pattern: &Regex, text: &str) -> Option<String> {
    let captures = pattern.captures(text)?;
    non_blank(captures.name("value").map(|m| m.as_str()))
}

/// Derive a candidate from one event, or `None` when no name can be found.
pub fn extract_candidate(event: &RawCalendarEvent) -> Option<CalendarCustomerCandidate> {
    let people = event.attendees.iter().filter(|attendee| !attendee.resource);

    let mut name = non_blank(event.summary.as_deref());
    let mut email = None;
    for attendee in people {
        if email.is_none() {
            email = non_blank(attendee.email.as_deref());
        }
        if name.is_none() {
            name = non_blank(attendee.display_name.as_deref());
        }
        if email.is_some() && name.is_some() {
            break;
        }
    }

    let Some(name) = name else {
        debug!(event_id = ?event.id, "Skipping calendar event without a name");
        return None;
    };

    let description = non_blank(event.description.as_deref());
    let parsed = description.as_deref().map(parse_description).unwrap_or_default();

    Some(CalendarCustomerCandidate {
        name,
        email: email.or(parsed.email),
        phone: parsed.phone,
        address: parsed.address.or_else(|| non_blank(event.location.as_deref())),
        notes: description,
        event_id: event.id.clone(),
    })
}

/// Extract candidates from every event, keeping event order.
pub fn extract_all_candidates(events: &[RawCalendarEvent]) -> Vec<CalendarCustomerCandidate> {
    let candidates: Vec<_> = events.iter().filter_map(extract_candidate).collect();
    info!(events = events.len(), candidates = candidates.len(), "Extracted customer candidates");
    candidates
}
