//! Statistics and summary types for calendar customer sync
//!
//! This module centralizes the plain-data results handed back to callers:
//! - Per-batch reconciliation counters
//! - Details of a calendar sync run (window, counts)

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{DeskError, Result};

/* -------------------------------------------------------------------------- */
/* Reconciliation Statistics */
/* -------------------------------------------------------------------------- */

/// Outcome counters of one reconciliation batch.
///
/// `total == created + updated + skipped` holds for every completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl SyncStats {
    pub fn record_created(&mut self) {
        self.total += 1;
        self.created += 1;
    }

    pub fn record_updated(&mut self) {
        self.total += 1;
        self.updated += 1;
    }

    pub fn record_skipped(&mut self) {
        self.total += 1;
        self.skipped += 1;
    }

    /// Whether the counters add up.
    pub fn is_consistent(&self) -> bool {
        self.total == self.created + self.updated + self.skipped
    }
}

/* -------------------------------------------------------------------------- */
/* Sync Window */
/* -------------------------------------------------------------------------- */

/// Absolute time range used to query the calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncWindow {
    pub time_min: DateTime<Utc>,
    pub time_max: DateTime<Utc>,
}

impl SyncWindow {
    /// `[now - past_days, now + future_days]`, with negative inputs treated
    /// as zero.
    ///
    /// Returns `InvalidInput` when either bound falls outside the
    /// representable date range.
    pub fn around(now: DateTime<Utc>, past_days: i64, future_days: i64) -> Result<Self> {
        let time_min = TimeDelta::try_days(past_days.max(0))
            .and_then(|delta| now.checked_sub_signed(delta))
            .ok_or_else(|| {
                DeskError::InvalidInput(format!("past_days {past_days} is out of range"))
            })?;
        let time_max = TimeDelta::try_days(future_days.max(0))
            .and_then(|delta| now.checked_add_signed(delta))
            .ok_or_else(|| {
                DeskError::InvalidInput(format!("future_days {future_days} is out of range"))
            })?;
        Ok(Self { time_min, time_max })
    }

    pub fn time_min_rfc3339(&self) -> String {
        to_rfc3339(self.time_min)
    }

    pub fn time_max_rfc3339(&self) -> String {
        to_rfc3339(self.time_max)
    }
}

/// RFC3339 in UTC with a `Z` suffix, the form the Calendar API expects.
pub fn to_rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/* -------------------------------------------------------------------------- */
/* Sync Details */
/* -------------------------------------------------------------------------- */

/// Operator-facing summary of a calendar sync run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncDetails {
    pub calendar_id: String,
    pub events_count: usize,
    pub candidates_count: usize,
    pub past_days: i64,
    pub future_days: i64,
    pub max_results: i64,
    pub time_min: String,
    pub time_max: String,
}

impl SyncDetails {
    /// One-line summary suitable for a flash message.
    pub fn summary(&self, stats: &SyncStats) -> String {
        format!(
            "Calendar {}: {} events, {} candidates; {} created, {} updated, {} unchanged",
            self.calendar_id,
            self.events_count,
            self.candidates_count,
            stats.created,
            stats.updated,
            stats.skipped
        )
    }
}
