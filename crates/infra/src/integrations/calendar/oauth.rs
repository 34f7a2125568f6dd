//! File-backed Google OAuth credentials.
//!
//! Calendar access is set up out of band: a client-secrets file downloaded
//! from the Google console plus an authorized-user token file produced by a
//! one-time consent. This store only reads the token, refreshes it when it
//! has expired, and writes the refreshed token back.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use ticketdesk_core::{CalendarCredentialStore, CalendarCredentials};
use ticketdesk_domain::{CalendarConfig, DeskError, Result};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::errors::InfraError;

pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens expiring within this window are refreshed ahead of time.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Authorized-user token file contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedUserToken {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_uri: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub expiry: Option<DateTime<Utc>>,
}

impl AuthorizedUserToken {
    /// Access token present and not about to expire. A token without an
    /// expiry is treated as valid.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let has_token = self.token.as_deref().is_some_and(|t| !t.trim().is_empty());
        let fresh = self
            .expiry
            .map_or(true, |expiry| expiry > now + chrono::Duration::seconds(EXPIRY_MARGIN_SECS));
        has_token && fresh
    }

    fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

#[derive(Debug, Clone, Deserialize)]
struct ClientSecrets {
    client_id: String,
    client_secret: Option<String>,
    token_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

/// Absolute expiry for a server-supplied lifetime. Lifetimes that cannot be
/// represented expire immediately so the next resolve refreshes again.
fn expiry_after(now: DateTime<Utc>, expires_in_secs: i64) -> DateTime<Utc> {
    TimeDelta::try_seconds(expires_in_secs)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or(now)
}

/// Credential store backed by the client-secrets and token files.
pub struct TokenFileCredentialStore {
    credentials_file: PathBuf,
    token_file: PathBuf,
    scopes: Vec<String>,
    http: Client,
    token_uri_override: Option<String>,
    // Serializes refresh so two callers never race on the token file.
    refresh_lock: Mutex<()>,
}

impl TokenFileCredentialStore {
    pub fn new(
        credentials_file: impl Into<PathBuf>,
        token_file: impl Into<PathBuf>,
        scopes: Vec<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build().map_err(InfraError::from)?;
        Ok(Self {
            credentials_file: credentials_file.into(),
            token_file: token_file.into(),
            scopes,
            http,
            token_uri_override: None,
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn from_config(config: &CalendarConfig) -> Result<Self> {
        Self::new(
            &config.credentials_file,
            &config.token_file,
            config.scopes.clone(),
            config.http_timeout(),
        )
    }

    /// Send refresh requests here instead of the URI recorded in the files.
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri_override = Some(token_uri.into());
        self
    }

    pub fn token_file(&self) -> &Path {
        &self.token_file
    }

    async fn load_token(&self) -> Result<Option<AuthorizedUserToken>> {
        let raw = match tokio::fs::read_to_string(&self.token_file).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(InfraError::from(err).into()),
        };
        let token = serde_json::from_str(&raw).map_err(|e| {
            DeskError::Auth(format!("token file {} is unreadable: {e}", self.token_file.display()))
        })?;
        Ok(Some(token))
    }

    async fn load_client_secrets(&self) -> Result<ClientSecrets> {
        let raw =
            tokio::fs::read_to_string(&self.credentials_file).await.map_err(InfraError::from)?;
        let file: ClientSecretsFile = serde_json::from_str(&raw).map_err(|e| {
            DeskError::Config(format!(
                "client secrets file {} is invalid: {e}",
                self.credentials_file.display()
            ))
        })?;
        file.installed.or(file.web).ok_or_else(|| {
            DeskError::Config(format!(
                "client secrets file {} has no 'installed' or 'web' section",
                self.credentials_file.display()
            ))
        })
    }

    async fn persist_token(&self, token: &AuthorizedUserToken) -> Result<()> {
        if let Some(parent) = self.token_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(InfraError::from)?;
        }
        let body = serde_json::to_string_pretty(token).map_err(InfraError::from)?;
        tokio::fs::write(&self.token_file, body).await.map_err(InfraError::from)?;
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn refresh(&self, mut token: AuthorizedUserToken) -> Result<AuthorizedUserToken> {
        let Some(refresh_token) = token.refresh_token().map(str::to_owned) else {
            return Err(DeskError::Auth(
                "calendar token expired and has no refresh token; authorize calendar access again"
                    .into(),
            ));
        };

        // The token file normally carries the client; fall back to the secrets file.
        let secrets = match (&token.client_id, &token.client_secret) {
            (Some(_), Some(_)) => None,
            _ => Some(self.load_client_secrets().await?),
        };
        let client_id = token
            .client_id
            .clone()
            .or_else(|| secrets.as_ref().map(|s| s.client_id.clone()))
            .unwrap_or_default();
        let client_secret = token
            .client_secret
            .clone()
            .or_else(|| secrets.as_ref().and_then(|s| s.client_secret.clone()))
            .unwrap_or_default();
        let token_uri = self
            .token_uri_override
            .clone()
            .or_else(|| token.token_uri.clone())
            .or_else(|| secrets.as_ref().and_then(|s| s.token_uri.clone()))
            .unwrap_or_else(|| GOOGLE_TOKEN_URI.to_string());

        let response = self
            .http
            .post(&token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(InfraError::from)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DeskError::Auth(format!("token refresh failed ({status}): {body}")));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| DeskError::Auth(format!("failed to parse token response: {e}")))?;

        token.token = Some(refreshed.access_token);
        token.expiry = refreshed.expires_in.map(|secs| expiry_after(Utc::now(), secs));
        if let Some(rotated) = refreshed.refresh_token {
            token.refresh_token = Some(rotated);
        }
        token.client_id = Some(client_id);
        token.client_secret = Some(client_secret);
        token.token_uri = Some(token_uri);
        if token.scopes.is_empty() {
            token.scopes = self.scopes.clone();
        }

        self.persist_token(&token).await?;
        info!(token_file = %self.token_file.display(), "Refreshed calendar access token");
        Ok(token)
    }
}

#[async_trait]
impl CalendarCredentialStore for TokenFileCredentialStore {
    fn is_configured(&self) -> bool {
        self.credentials_file.exists()
    }

    #[instrument(skip(self))]
    async fn resolve(&self) -> Result<Option<CalendarCredentials>> {
        if !self.is_configured() {
            debug!(path = %self.credentials_file.display(), "Calendar client secrets file not found");
            return Ok(None);
        }

        let _guard = self.refresh_lock.lock().await;

        let Some(token) = self.load_token().await? else {
            warn!(
                path = %self.token_file.display(),
                "No calendar token file; authorize calendar access first"
            );
            return Ok(None);
        };

        let token =
            if token.is_valid_at(Utc::now()) { token } else { self.refresh(token).await? };

        match token.token {
            Some(access_token) if !access_token.trim().is_empty() => {
                Ok(Some(CalendarCredentials { access_token }))
            }
            _ => Err(DeskError::Auth("calendar token file holds no access token".into())),
        }
    }
}
