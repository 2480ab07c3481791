//! Study sessions and the progress aggregate they feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub words_studied: Vec<String>,
    #[serde(default)]
    pub words_learned: Vec<String>,
    /// Milliseconds; zero until the session ends.
    #[serde(default)]
    pub duration: u64,
}

impl StudySession {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            start_time: now,
            end_time: None,
            words_studied: Vec::new(),
            words_learned: Vec::new(),
            duration: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }

    pub(crate) fn note_studied(&mut self, word_id: &str) {
        if !self.words_studied.iter().any(|id| id == word_id) {
            self.words_studied.push(word_id.to_string());
        }
    }

    pub(crate) fn note_learned(&mut self, word_id: &str) {
        if !self.words_learned.iter().any(|id| id == word_id) {
            self.words_learned.push(word_id.to_string());
        }
    }

    pub(crate) fn finish(&mut self, now: DateTime<Utc>) {
        let end = now.max(self.start_time);
        self.end_time = Some(end);
        self.duration = (end - self.start_time).num_milliseconds() as u64;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    #[serde(default)]
    pub total_words: u64,
    #[serde(default)]
    pub learned_words: u64,
    /// Milliseconds spent in finished study sessions.
    #[serde(default)]
    pub total_time_spent: u64,
    #[serde(default)]
    pub total_sessions: u64,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_study_date: Option<DateTime<Utc>>,
}

impl UserProgress {
    /// Fold a finished session into the aggregate.
    pub fn record_session(&mut self, session: &StudySession) {
        let Some(end) = session.end_time else {
            return;
        };
        self.total_time_spent += session.duration;
        self.total_sessions += 1;
        self.current_streak = next_streak(self.current_streak, self.last_study_date, end);
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.last_study_date = Some(end);
    }
}

/// Consecutive UTC days with at least one finished session.
pub fn next_streak(current: u32, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u32 {
    let Some(last) = last else {
        return 1;
    };
    let gap = (now.date_naive() - last.date_naive()).num_days();
    match gap {
        i64::MIN..=0 => current.max(1),
        1 => current + 1,
        _ => 1,
    }
}

/// Result of ending a study session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyOutcome {
    pub session: StudySession,
    pub progress: UserProgress,
    /// A pending block was cleared by this session.
    pub block_cleared: bool,
}
