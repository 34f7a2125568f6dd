//! Scheduling infrastructure for automated task execution
//!
//! Currently a single interval scheduler drives the calendar customer sync.
//! It follows the same runtime rules as every background task here:
//! - Explicit lifecycle management (start/stop)
//! - Join handles for spawned tasks
//! - Cancellation token support
//! - Timeout on join
//! - Structured tracing

pub mod calendar_scheduler;
pub mod error;

pub use calendar_scheduler::{CalendarScheduler, CalendarSchedulerConfig, TickOutcome};
pub use error::{SchedulerError, SchedulerResult};
