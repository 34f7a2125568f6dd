//! Google Calendar integration
//!
//! `GoogleCalendarClient` implements the core `CalendarSource` port against
//! the Calendar v3 REST API; `TokenFileCredentialStore` implements
//! `CalendarCredentialStore` on top of the OAuth token files.

pub mod google;
pub mod oauth;

pub use google::{GoogleCalendarClient, GOOGLE_CALENDAR_API_BASE};
pub use oauth::{AuthorizedUserToken, TokenFileCredentialStore, GOOGLE_TOKEN_URI};
