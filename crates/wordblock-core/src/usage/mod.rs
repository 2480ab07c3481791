//! Device usage: the OS-facing sample source and in-app screen tracking.

mod recorded;
mod tracker;

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::UsageError;

pub use recorded::{RecordedUsageSource, UsageSample};
pub use tracker::{
    daily_usage, most_used_screens, DailyUsage, ScreenTime, ScreenTracker, UsageSession,
    MAX_USAGE_SESSIONS,
};

/// Provider of per-application foreground time.
///
/// Implementations must be queryable from a background task.
pub trait UsageSource: Send + Sync {
    /// Whether the OS grants access to usage statistics.
    fn has_usage_access_permission(&self) -> bool;

    /// Send the user to the OS screen where access is granted.
    /// Fire-and-forget.
    fn open_usage_access_settings(&self);

    /// Foreground milliseconds per application id within `[start, end]`.
    fn aggregate_usage(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<HashMap<String, u64>, UsageError>;
}

/// Source used where no usage API exists. Never grants permission.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullUsageSource;

impl UsageSource for NullUsageSource {
    fn has_usage_access_permission(&self) -> bool {
        false
    }

    fn open_usage_access_settings(&self) {
        tracing::info!("no usage access settings available on this platform");
    }

    fn aggregate_usage(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<HashMap<String, u64>, UsageError> {
        Err(UsageError::PermissionDenied)
    }
}
