//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `TICKETDESK_DB_PATH` is not set, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `TICKETDESK_DB_PATH`: Database file path (required for env loading)
//! - `TICKETDESK_DB_POOL_SIZE`: Connection pool size
//! - `TICKETDESK_DB_BUSY_TIMEOUT_MS`: SQLite busy timeout
//! - `TICKETDESK_CALENDAR_CREDENTIALS_FILE`: OAuth client-secrets file
//! - `TICKETDESK_CALENDAR_TOKEN_FILE`: Authorized-user token file
//! - `TICKETDESK_CALENDAR_SCOPES`: Comma separated OAuth scopes
//! - `TICKETDESK_CALENDAR_ID`: Calendar to read (default `primary`)
//! - `TICKETDESK_CALENDAR_PAST_DAYS` / `TICKETDESK_CALENDAR_FUTURE_DAYS`
//! - `TICKETDESK_CALENDAR_MAX_RESULTS`
//! - `TICKETDESK_CALENDAR_AUTO_SYNC`: Whether the scheduler runs (true/false)
//! - `TICKETDESK_CALENDAR_SYNC_INTERVAL`: Scheduler interval in seconds
//! - `TICKETDESK_CALENDAR_HTTP_TIMEOUT`: Calendar API timeout in seconds
//! - `TICKETDESK_CALENDAR_API_BASE_URL`: Calendar API base URL override
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./ticketdesk.toml` or `./ticketdesk.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ticketdesk_domain::{
    parse_calendar_scopes, CalendarConfig, Config, DatabaseConfig, DeskError, Result,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the database path
/// is not set there, falls back to loading from a config file.
///
/// # Errors
/// Returns `DeskError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A value has the wrong type
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `TICKETDESK_DB_PATH` is required; every other setting falls back to
/// its default.
///
/// # Errors
/// Returns `DeskError::Config` if the database path is missing or a value
/// cannot be parsed.
pub fn load_from_env() -> Result<Config> {
    let db_defaults = DatabaseConfig::default();
    let database = DatabaseConfig {
        path: env_var("TICKETDESK_DB_PATH")?,
        pool_size: env_parse("TICKETDESK_DB_POOL_SIZE", db_defaults.pool_size)?,
        busy_timeout_ms: env_parse("TICKETDESK_DB_BUSY_TIMEOUT_MS", db_defaults.busy_timeout_ms)?,
    };

    let defaults = CalendarConfig::default();
    let calendar = CalendarConfig {
        credentials_file: env_string("TICKETDESK_CALENDAR_CREDENTIALS_FILE")
            .unwrap_or(defaults.credentials_file),
        token_file: env_string("TICKETDESK_CALENDAR_TOKEN_FILE").unwrap_or(defaults.token_file),
        scopes: env_string("TICKETDESK_CALENDAR_SCOPES")
            .map(|raw| parse_calendar_scopes(&raw))
            .unwrap_or(defaults.scopes),
        calendar_id: env_string("TICKETDESK_CALENDAR_ID").unwrap_or(defaults.calendar_id),
        past_days: env_parse("TICKETDESK_CALENDAR_PAST_DAYS", defaults.past_days)?,
        future_days: env_parse("TICKETDESK_CALENDAR_FUTURE_DAYS", defaults.future_days)?,
        max_results: env_parse("TICKETDESK_CALENDAR_MAX_RESULTS", defaults.max_results)?,
        auto_sync: env_bool("TICKETDESK_CALENDAR_AUTO_SYNC", defaults.auto_sync),
        interval_seconds: env_parse("TICKETDESK_CALENDAR_SYNC_INTERVAL", defaults.interval_seconds)?,
        http_timeout_secs: env_parse("TICKETDESK_CALENDAR_HTTP_TIMEOUT", defaults.http_timeout_secs)?,
        api_base_url: env_string("TICKETDESK_CALENDAR_API_BASE_URL").or(defaults.api_base_url),
    };

    Ok(Config { database, calendar })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `DeskError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(DeskError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            DeskError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| DeskError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DeskError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DeskError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(DeskError::Config(format!("Unsupported config format: {}", extension))),
    }
}

const CONFIG_FILE_NAMES: [&str; 4] =
    ["ticketdesk.toml", "ticketdesk.json", "config.toml", "config.json"];

/// Probe the working directory, then the executable's directory, for a
/// config file.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        DeskError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Optional environment variable, blank treated as unset.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Parse an optional environment variable, falling back to `default` when
/// unset.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| DeskError::Config(format!("Invalid value for {}: {}", key, e))),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
