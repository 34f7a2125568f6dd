//! Domain types and models

pub mod calendar;
pub mod customer;
pub mod stats;

pub use calendar::{CalendarAttendee, CalendarCustomerCandidate, RawCalendarEvent};
pub use customer::{non_blank, Customer, CustomerCode, CustomerField, FieldChange, NewCustomer};
pub use stats::{to_rfc3339, SyncDetails, SyncStats, SyncWindow};
