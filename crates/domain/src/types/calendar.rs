//! Calendar event and candidate types
//!
//! `RawCalendarEvent` is the provider-neutral shape returned by a calendar
//! source; `CalendarCustomerCandidate` is what the extractor derives from it.

use serde::{Deserialize, Serialize};

use super::customer::{CustomerField, NewCustomer};

/// Event attendee as reported by the calendar provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarAttendee {
    pub email: Option<String>,
    pub display_name: Option<String>,
    /// Rooms and equipment are attendees too; they never identify a customer.
    #[serde(default)]
    pub resource: bool,
}

/// Raw calendar event from provider API (before extraction)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCalendarEvent {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub attendees: Vec<CalendarAttendee>,
}

/// Customer data extracted from a single calendar event. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarCustomerCandidate {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Event description, kept for traceability only.
    pub notes: Option<String>,
    /// Provenance: id of the source calendar event.
    pub event_id: Option<String>,
}

impl CalendarCustomerCandidate {
    pub fn field(&self, field: CustomerField) -> Option<&str> {
        match field {
            CustomerField::Name => Some(self.name.as_str()),
            CustomerField::Email => self.email.as_deref(),
            CustomerField::Phone => self.phone.as_deref(),
            CustomerField::Address => self.address.as_deref(),
        }
    }

    /// Normalized contact data ready for insertion.
    pub fn to_new_customer(&self) -> NewCustomer {
        NewCustomer::normalized(
            &self.name,
            self.email.as_deref(),
            self.phone.as_deref(),
            self.address.as_deref(),
        )
    }
}
