//! Per-screen visit tracking inside the app.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::SharedDatabase;

/// Oldest visits are evicted past this count.
pub const MAX_USAGE_SESSIONS: usize = 1000;

/// One visit to a screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSession {
    pub id: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub duration: u64,
    pub screen_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub total_time: u64,
    pub sessions: u64,
    pub screens: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenTime {
    pub screen: String,
    pub time: u64,
}

/// Visits started within the last `days` days, grouped per UTC day,
/// oldest first.
pub fn daily_usage(sessions: &[UsageSession], days: u32, now: DateTime<Utc>) -> Vec<DailyUsage> {
    let since = Duration::try_days(i64::from(days))
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let mut by_day: BTreeMap<NaiveDate, DailyUsage> = BTreeMap::new();

    for s in sessions.iter().filter(|s| s.start_time >= since) {
        let date = s.start_time.date_naive();
        let day = by_day.entry(date).or_insert_with(|| DailyUsage {
            date,
            total_time: 0,
            sessions: 0,
            screens: BTreeMap::new(),
        });
        day.total_time += s.duration;
        day.sessions += 1;
        *day.screens.entry(s.screen_name.clone()).or_default() += s.duration;
    }

    by_day.into_values().collect()
}

/// Screens ranked by total visit time over the last `days` days.
pub fn most_used_screens(sessions: &[UsageSession], days: u32, now: DateTime<Utc>) -> Vec<ScreenTime> {
    let mut totals: HashMap<String, u64> = HashMap::new();
    for day in daily_usage(sessions, days, now) {
        for (screen, time) in day.screens {
            *totals.entry(screen).or_default() += time;
        }
    }
    let mut ranked: Vec<ScreenTime> = totals
        .into_iter()
        .map(|(screen, time)| ScreenTime { screen, time })
        .collect();
    ranked.sort_by(|a, b| b.time.cmp(&a.time).then_with(|| a.screen.cmp(&b.screen)));
    ranked
}

/// Tracks the screen currently shown and persists finished visits.
pub struct ScreenTracker {
    db: Arc<SharedDatabase>,
    current: Option<UsageSession>,
}

impl ScreenTracker {
    pub fn new(db: Arc<SharedDatabase>) -> Self {
        Self { db, current: None }
    }

    /// Finish the current visit (if any) and start one for `screen_name`.
    pub fn enter_screen(&mut self, screen_name: &str, now: DateTime<Utc>) -> Result<()> {
        self.end_current(now)?;
        self.current = Some(UsageSession {
            id: uuid::Uuid::new_v4().to_string(),
            start_time: now,
            end_time: None,
            duration: 0,
            screen_name: screen_name.to_string(),
        });
        Ok(())
    }

    /// Finish and persist the current visit. Returns it, if there was one.
    pub fn end_current(&mut self, now: DateTime<Utc>) -> Result<Option<UsageSession>> {
        let Some(mut session) = self.current.take() else {
            return Ok(None);
        };
        session.end_time = Some(now);
        session.duration = (now - session.start_time).num_milliseconds().max(0) as u64;
        self.db.with(|db| db.append_usage_session(session.clone()))?;
        Ok(Some(session))
    }
}
