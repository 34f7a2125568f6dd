//! Configuration management

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CALENDAR_ID, DEFAULT_CALENDAR_SCOPE, DEFAULT_FUTURE_DAYS, DEFAULT_MAX_RESULTS,
    DEFAULT_PAST_DAYS, DEFAULT_SYNC_INTERVAL_SECS, MIN_SYNC_INTERVAL_SECS,
};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "ticketdesk.db".to_string(), pool_size: 4, busy_timeout_ms: 5_000 }
    }
}

/// Google Calendar sync configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// OAuth client-secrets file. Its absence means calendar sync is not
    /// configured.
    pub credentials_file: String,
    /// Authorized-user token file written after consent and on refresh.
    pub token_file: String,
    #[serde(deserialize_with = "deserialize_scopes")]
    pub scopes: Vec<String>,
    pub calendar_id: String,
    pub past_days: i64,
    pub future_days: i64,
    pub max_results: i64,
    /// Whether the background scheduler runs.
    pub auto_sync: bool,
    pub interval_seconds: u64,
    pub http_timeout_secs: u64,
    /// Overrides the Google Calendar API base URL.
    pub api_base_url: Option<String>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            credentials_file: "credentials.json".to_string(),
            token_file: "token.json".to_string(),
            scopes: vec![DEFAULT_CALENDAR_SCOPE.to_string()],
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            past_days: DEFAULT_PAST_DAYS,
            future_days: DEFAULT_FUTURE_DAYS,
            max_results: DEFAULT_MAX_RESULTS,
            auto_sync: true,
            interval_seconds: DEFAULT_SYNC_INTERVAL_SECS,
            http_timeout_secs: 30,
            api_base_url: None,
        }
    }
}

impl CalendarConfig {
    /// Scheduler period, never shorter than one minute.
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.max(MIN_SYNC_INTERVAL_SECS))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    /// Configured calendar id, falling back to `primary` when blank.
    pub fn default_calendar_id(&self) -> &str {
        let trimmed = self.calendar_id.trim();
        if trimmed.is_empty() {
            DEFAULT_CALENDAR_ID
        } else {
            trimmed
        }
    }
}

/// Split a comma separated scope list, dropping blanks. An empty result
/// falls back to the read-only calendar scope.
pub fn parse_calendar_scopes(raw: &str) -> Vec<String> {
    normalize_scopes(raw.split(','))
}

fn normalize_scopes<'a>(items: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let scopes: Vec<String> = items
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if scopes.is_empty() {
        vec![DEFAULT_CALENDAR_SCOPE.to_string()]
    } else {
        scopes
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScopesRepr {
    List(Vec<String>),
    Joined(String),
}

fn deserialize_scopes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match ScopesRepr::deserialize(deserializer)? {
        ScopesRepr::List(items) => normalize_scopes(items.iter().map(String::as_str)),
        ScopesRepr::Joined(raw) => parse_calendar_scopes(&raw),
    })
}
