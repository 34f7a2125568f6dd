//! Calendar synchronization scheduler for periodic customer sync.
//!
//! Runs one sync immediately on start and then once per interval until
//! stopped. A non-blocking run-lock guarantees that at most one sync is in
//! flight: a tick that finds the lock taken is skipped, never queued.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ticketdesk_core::{CalendarCredentialStore, CalendarSyncRunner};
//! use ticketdesk_infra::scheduling::{CalendarScheduler, CalendarSchedulerConfig, SchedulerResult};
//!
//! # async fn example(
//! #     runner: Arc<dyn CalendarSyncRunner>,
//! #     credentials: Arc<dyn CalendarCredentialStore>,
//! # ) -> SchedulerResult<()> {
//! let mut scheduler =
//!     CalendarScheduler::new(runner, credentials, CalendarSchedulerConfig::default());
//!
//! scheduler.start();
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use ticketdesk_core::{CalendarCredentialStore, CalendarSyncRunner, SyncRequest};
use ticketdesk_domain::constants::{DEFAULT_SYNC_INTERVAL_SECS, MIN_SYNC_INTERVAL_SECS};
use ticketdesk_domain::{CalendarConfig, DeskError, SyncStats};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the calendar scheduler.
#[derive(Debug, Clone)]
pub struct CalendarSchedulerConfig {
    /// Time between the end of one tick and the start of the next.
    pub interval: Duration,
    /// Parameters passed to every scheduled sync.
    pub request: SyncRequest,
    /// Timeout for awaiting the loop task on stop.
    pub join_timeout: Duration,
}

impl Default for CalendarSchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_SYNC_INTERVAL_SECS),
            request: SyncRequest::default(),
            join_timeout: Duration::from_secs(1),
        }
    }
}

impl CalendarSchedulerConfig {
    pub fn from_calendar(config: &CalendarConfig) -> Self {
        Self {
            interval: config.sync_interval(),
            request: SyncRequest::from(config),
            ..Self::default()
        }
    }

    fn effective_interval(&self) -> Duration {
        self.interval.max(Duration::from_secs(MIN_SYNC_INTERVAL_SECS))
    }
}

/// Result of a single tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Completed(SyncStats),
    /// Another sync held the run-lock.
    SkippedBusy,
    /// Calendar access is not set up.
    SkippedMissingCredentials,
    Failed(DeskError),
}

/// State shared between the loop task and manual triggers
struct TickContext {
    runner: Arc<dyn CalendarSyncRunner>,
    credentials: Arc<dyn CalendarCredentialStore>,
    request: SyncRequest,
    run_lock: Arc<Mutex<()>>,
}

impl TickContext {
    async fn tick(&self) -> TickOutcome {
        let Ok(_guard) = Arc::clone(&self.run_lock).try_lock_owned() else {
            debug!("Calendar sync already running, skipping tick");
            return TickOutcome::SkippedBusy;
        };

        if !self.credentials.is_configured() {
            warn!("Calendar sync skipped: credentials are not configured");
            return TickOutcome::SkippedMissingCredentials;
        }

        let started = Instant::now();
        // Own task so a panicking sync surfaces as a failed tick instead of
        // unwinding through the scheduler loop.
        let runner = Arc::clone(&self.runner);
        let request = self.request.clone();
        let result = match tokio::spawn(async move { runner.run_sync(request).await }).await {
            Ok(result) => result,
            Err(join_err) if join_err.is_panic() => {
                Err(DeskError::Internal(format!("calendar sync panicked: {join_err}")))
            }
            Err(join_err) => {
                Err(DeskError::Internal(format!("calendar sync task failed: {join_err}")))
            }
        };

        match result {
            Ok((stats, details)) => {
                info!(
                    calendar_id = %details.calendar_id,
                    created = stats.created,
                    updated = stats.updated,
                    skipped = stats.skipped,
                    elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "Automatic calendar sync completed"
                );
                TickOutcome::Completed(stats)
            }
            Err(err @ DeskError::Config(_)) => {
                warn!(error = %err, "Cannot run automatic calendar sync");
                TickOutcome::Failed(err)
            }
            Err(err) => {
                error!(error = %err, kind = err.label(), "Unexpected error during automatic calendar sync");
                TickOutcome::Failed(err)
            }
        }
    }
}

/// Calendar synchronization scheduler with explicit lifecycle management.
pub struct CalendarScheduler {
    context: Arc<TickContext>,
    config: CalendarSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl CalendarScheduler {
    pub fn new(
        runner: Arc<dyn CalendarSyncRunner>,
        credentials: Arc<dyn CalendarCredentialStore>,
        config: CalendarSchedulerConfig,
    ) -> Self {
        let context = TickContext {
            runner,
            credentials,
            request: config.request.clone(),
            run_lock: Arc::new(Mutex::new(())),
        };
        Self {
            context: Arc::new(context),
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// Spawn the background loop. No-op when already running.
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip(self))]
    pub fn start(&mut self) {
        if self.is_running() {
            debug!("Calendar scheduler already running");
            return;
        }

        // Fresh token so the scheduler can be restarted after stop.
        self.cancellation_token = CancellationToken::new();

        let context = Arc::clone(&self.context);
        let interval = self.config.effective_interval();
        let cancel = self.cancellation_token.clone();

        self.task_handle = Some(tokio::spawn(async move {
            Self::sync_loop(context, interval, cancel).await;
        }));

        info!(interval_secs = interval.as_secs(), "Calendar scheduler started");
    }

    /// Cancel the loop and wait briefly for it to finish. No-op when
    /// stopped.
    ///
    /// A sync already in flight is not interrupted; if it outlives the join
    /// timeout the task is left to finish on its own.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let Some(handle) = self.task_handle.take() else {
            return Ok(());
        };

        self.cancellation_token.cancel();

        let join_timeout = self.config.join_timeout;
        match tokio::time::timeout(join_timeout, handle).await {
            Ok(Ok(())) => {
                info!("Calendar scheduler stopped");
                Ok(())
            }
            Ok(Err(join_err)) => Err(SchedulerError::TaskJoinFailed(join_err.to_string())),
            Err(_) => {
                warn!(timeout_secs = join_timeout.as_secs(), "Calendar scheduler did not stop in time");
                Err(SchedulerError::Timeout { seconds: join_timeout.as_secs() })
            }
        }
    }

    /// Whether the background loop is alive.
    pub fn is_running(&self) -> bool {
        self.task_handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Run one sync now through the same run-lock as scheduled ticks.
    pub async fn trigger_now(&self) -> TickOutcome {
        self.context.tick().await
    }

    async fn sync_loop(context: Arc<TickContext>, interval: Duration, cancel: CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                break;
            }

            let outcome = context.tick().await;
            debug!(outcome = ?outcome, "Calendar scheduler tick finished");

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Calendar scheduler loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }
}

impl Drop for CalendarScheduler {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}
