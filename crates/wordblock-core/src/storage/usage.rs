use chrono::{DateTime, Duration, Utc};

use super::database::Database;
use super::keys;
use crate::error::Result;
use crate::usage::{self, DailyUsage, ScreenTime, UsageSample, UsageSession, MAX_USAGE_SESSIONS};

/// Oldest recorded samples are evicted past this count.
pub const MAX_USAGE_SAMPLES: usize = 5000;

const USAGE_SESSION_RETENTION_DAYS: i64 = 30;

fn truncate_front<T>(items: &mut Vec<T>, cap: usize) {
    if items.len() > cap {
        items.drain(..items.len() - cap);
    }
}

impl Database {
    pub fn usage_sessions(&self) -> Result<Vec<UsageSession>> {
        self.get_json(keys::USAGE_SESSIONS, Vec::new())
    }

    /// Append a finished screen visit, keeping the newest
    /// [`MAX_USAGE_SESSIONS`].
    pub fn append_usage_session(&self, session: UsageSession) -> Result<()> {
        let mut sessions = self.usage_sessions()?;
        sessions.push(session);
        truncate_front(&mut sessions, MAX_USAGE_SESSIONS);
        self.set_json(keys::USAGE_SESSIONS, &sessions)
    }

    /// Drop visits older than 30 days. Returns how many were removed.
    pub fn cleanup_usage_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = now - Duration::days(USAGE_SESSION_RETENTION_DAYS);
        let mut sessions = self.usage_sessions()?;
        let before = sessions.len();
        sessions.retain(|s| s.start_time > cutoff);
        let removed = before - sessions.len();
        if removed > 0 {
            self.set_json(keys::USAGE_SESSIONS, &sessions)?;
        }
        Ok(removed)
    }

    pub fn daily_usage(&self, days: u32, now: DateTime<Utc>) -> Result<Vec<DailyUsage>> {
        Ok(usage::daily_usage(&self.usage_sessions()?, days, now))
    }

    pub fn most_used_screens(&self, days: u32, now: DateTime<Utc>) -> Result<Vec<ScreenTime>> {
        Ok(usage::most_used_screens(&self.usage_sessions()?, days, now))
    }

    pub fn usage_samples(&self) -> Result<Vec<UsageSample>> {
        self.get_json(keys::USAGE_SAMPLES, Vec::new())
    }

    pub fn record_usage_sample(&self, sample: UsageSample) -> Result<()> {
        let mut samples = self.usage_samples()?;
        samples.push(sample);
        truncate_front(&mut samples, MAX_USAGE_SAMPLES);
        self.set_json(keys::USAGE_SAMPLES, &samples)
    }
}
