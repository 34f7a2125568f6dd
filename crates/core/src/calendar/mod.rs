//! Calendar sync: candidate extraction and orchestration

pub mod extract;
pub mod ports;
pub mod service;

pub use extract::{extract_all_candidates, extract_candidate, parse_description, DescriptionFields};
pub use service::CalendarSyncService;
