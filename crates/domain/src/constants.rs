//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Customer code scheme
pub const CUSTOMER_CODE_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";
pub const CUSTOMER_CODE_BASE: u32 = 26;
pub const CUSTOMER_CODE_LENGTH: usize = 4;
pub const MAX_CUSTOMER_CODES: u32 = CUSTOMER_CODE_BASE.pow(CUSTOMER_CODE_LENGTH as u32);

// Calendar sync defaults
pub const DEFAULT_CALENDAR_ID: &str = "primary";
pub const DEFAULT_CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";
pub const DEFAULT_PAST_DAYS: i64 = 30;
pub const DEFAULT_FUTURE_DAYS: i64 = 7;
pub const DEFAULT_MAX_RESULTS: i64 = 250;

// Scheduler
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 3600;
pub const MIN_SYNC_INTERVAL_SECS: u64 = 60;
