use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UsageSource;
use crate::error::UsageError;
use crate::storage::SharedDatabase;

/// A chunk of foreground time recorded for one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSample {
    pub app_id: String,
    pub start_time: DateTime<Utc>,
    pub duration_ms: u64,
}

impl UsageSample {
    /// Saturates at the latest representable time.
    pub fn end_time(&self) -> DateTime<Utc> {
        i64::try_from(self.duration_ms)
            .ok()
            .and_then(chrono::Duration::try_milliseconds)
            .and_then(|d| self.start_time.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Milliseconds of this sample inside `[start, end]`.
    pub fn overlap_ms(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
        let from = self.start_time.max(start);
        let to = self.end_time().min(end);
        (to - from).num_milliseconds().max(0) as u64
    }
}

/// Usage source backed by samples stored in the database.
///
/// Stands in for the OS usage-stats service: samples are recorded by
/// the CLI (`usage record`) or an external collector.
pub struct RecordedUsageSource {
    db: Arc<SharedDatabase>,
    permission: bool,
}

impl RecordedUsageSource {
    pub fn new(db: Arc<SharedDatabase>, permission: bool) -> Self {
        Self { db, permission }
    }
}

impl UsageSource for RecordedUsageSource {
    fn has_usage_access_permission(&self) -> bool {
        self.permission
    }

    fn open_usage_access_settings(&self) {
        tracing::info!("grant usage access with `wordblock config set monitoring.usage_access true`");
    }

    fn aggregate_usage(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<HashMap<String, u64>, UsageError> {
        if !self.permission {
            return Err(UsageError::PermissionDenied);
        }
        if start > end {
            return Err(UsageError::InvalidWindow(format!("{start} is after {end}")));
        }

        let samples = self
            .db
            .with(|db| db.usage_samples())
            .map_err(|e| UsageError::QueryFailed(e.to_string()))?;

        let mut totals: HashMap<String, u64> = HashMap::new();
        for sample in &samples {
            let ms = sample.overlap_ms(start, end);
            if ms > 0 {
                *totals.entry(sample.app_id.clone()).or_default() += ms;
            }
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use chrono::Duration;

    fn sample(app: &str, start: DateTime<Utc>, minutes: i64) -> UsageSample {
        UsageSample {
            app_id: app.into(),
            start_time: start,
            duration_ms: Duration::minutes(minutes).num_milliseconds() as u64,
        }
    }

    #[test]
    fn overlap_clips_to_window() {
        let now = Utc::now();
        let s = sample("a", now - Duration::minutes(40), 20);
        assert_eq!(s.overlap_ms(now - Duration::minutes(30), now), 10 * 60_000);
        assert_eq!(s.overlap_ms(now - Duration::minutes(10), now), 0);
    }

    #[test]
    fn oversized_duration_saturates() {
        let now = Utc::now();
        let s = UsageSample {
            app_id: "a".into(),
            start_time: now - Duration::minutes(10),
            duration_ms: u64::MAX,
        };
        assert_eq!(s.end_time(), DateTime::<Utc>::MAX_UTC);
        assert_eq!(s.overlap_ms(now - Duration::minutes(30), now), 10 * 60_000);
    }

    #[test]
    fn aggregates_samples_per_app() {
        let now = Utc::now();
        let db = Database::open_memory().unwrap();
        db.record_usage_sample(sample("com.video", now - Duration::minutes(50), 10)).unwrap();
        db.record_usage_sample(sample("com.video", now - Duration::minutes(20), 10)).unwrap();
        db.record_usage_sample(sample("com.chat", now - Duration::minutes(5), 3)).unwrap();
        let source = RecordedUsageSource::new(Arc::new(SharedDatabase::new(db)), true);

        let usage = source
            .aggregate_usage(now - Duration::minutes(30), now)
            .unwrap();
        assert_eq!(usage["com.video"], 10 * 60_000);
        assert_eq!(usage["com.chat"], 3 * 60_000);
    }

    #[test]
    fn denied_source_refuses_queries() {
        let db = Database::open_memory().unwrap();
        let source = RecordedUsageSource::new(Arc::new(SharedDatabase::new(db)), false);
        let now = Utc::now();
        assert!(!source.has_usage_access_permission());
        assert!(matches!(
            source.aggregate_usage(now, now),
            Err(UsageError::PermissionDenied)
        ));
    }
}
