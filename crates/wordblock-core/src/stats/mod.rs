//! Learning statistics and chart buckets.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::BlockingSettings;
use crate::study::{StudySession, UserProgress};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_words: u64,
    pub learned_words: u64,
    pub total_time_spent: u64,
    pub total_sessions: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_blocks_triggered: u64,
    /// Sessions finished today (UTC).
    pub today_sessions: u64,
    /// Mean duration in milliseconds over all recorded sessions.
    pub average_session_time: f64,
    /// Percentage of words learned; 0 when there are no words.
    pub learning_rate: f64,
}

pub fn summarize(
    progress: &UserProgress,
    blocking: &BlockingSettings,
    sessions: &[StudySession],
    now: DateTime<Utc>,
) -> Statistics {
    let today = now.date_naive();
    let today_sessions = sessions
        .iter()
        .filter(|s| s.end_time.is_some_and(|end| end.date_naive() == today))
        .count() as u64;

    let average_session_time = if sessions.is_empty() {
        0.0
    } else {
        sessions.iter().map(|s| s.duration as f64).sum::<f64>() / sessions.len() as f64
    };

    let learning_rate = if progress.total_words == 0 {
        0.0
    } else {
        progress.learned_words as f64 / progress.total_words as f64 * 100.0
    };

    Statistics {
        total_words: progress.total_words,
        learned_words: progress.learned_words,
        total_time_spent: progress.total_time_spent,
        total_sessions: progress.total_sessions,
        current_streak: progress.current_streak,
        longest_streak: progress.longest_streak,
        total_blocks_triggered: blocking.total_blocks_triggered,
        today_sessions,
        average_session_time,
        learning_rate,
    }
}

/// One bar of a study-time chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartBucket {
    pub label: String,
    /// Whole minutes, rounded.
    pub minutes: u64,
}

fn minutes_between(sessions: &[StudySession], from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    let ms: u64 = sessions
        .iter()
        .filter(|s| s.start_time >= from && s.start_time < to)
        .map(|s| s.duration)
        .sum();
    (ms as f64 / 60_000.0).round() as u64
}

/// Last seven UTC days, oldest first, labelled by weekday.
pub fn daily_study_minutes(sessions: &[StudySession], now: DateTime<Utc>) -> Vec<ChartBucket> {
    let today = now.date_naive();
    (0..7)
        .rev()
        .filter_map(|back| {
            let day = today - Duration::days(back);
            let from = day.and_hms_opt(0, 0, 0)?.and_utc();
            Some(ChartBucket {
                label: day.weekday().to_string(),
                minutes: minutes_between(sessions, from, from + Duration::days(1)),
            })
        })
        .collect()
}

/// Four consecutive 7-day windows ending now, oldest first.
pub fn weekly_study_minutes(sessions: &[StudySession], now: DateTime<Utc>) -> Vec<ChartBucket> {
    let end = now + Duration::milliseconds(1);
    (0..4)
        .rev()
        .map(|back| {
            let to = end - Duration::weeks(back);
            ChartBucket {
                label: format!("Week {}", 4 - back),
                minutes: minutes_between(sessions, to - Duration::weeks(1), to),
            }
        })
        .collect()
}
