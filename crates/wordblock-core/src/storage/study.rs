use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::info;

use super::database::Database;
use super::keys;
use crate::error::{CoreError, Result};
use crate::study::{StudyOutcome, StudySession};

impl Database {
    pub fn study_sessions(&self) -> Result<Vec<StudySession>> {
        self.get_json(keys::STUDY_SESSIONS, Vec::new())
    }

    fn save_study_sessions(&self, sessions: &[StudySession]) -> Result<()> {
        self.set_json(keys::STUDY_SESSIONS, sessions)
    }

    pub fn study_session(&self, id: &str) -> Result<Option<StudySession>> {
        Ok(self.study_sessions()?.into_iter().find(|s| s.id == id))
    }

    /// Open and persist a new session.
    pub fn start_study_session(&self, now: DateTime<Utc>) -> Result<StudySession> {
        let session = StudySession::new(now);
        let mut sessions = self.study_sessions()?;
        sessions.push(session.clone());
        self.save_study_sessions(&sessions)?;
        Ok(session)
    }

    /// Note that `word_id` was studied in an open session; `learned` also
    /// marks the word learned.
    pub fn record_study(
        &self,
        session_id: &str,
        word_id: &str,
        learned: bool,
        now: DateTime<Utc>,
    ) -> Result<StudySession> {
        let mut sessions = self.study_sessions()?;
        let session = sessions
            .iter_mut()
            .find(|s| s.id == session_id && !s.is_finished())
            .ok_or_else(|| CoreError::not_found("open study session", session_id))?;

        self.record_review(word_id, now)?
            .ok_or_else(|| CoreError::not_found("word", word_id))?;
        session.note_studied(word_id);
        if learned {
            self.mark_word_learned(word_id, now)?;
            session.note_learned(word_id);
        }

        let updated = session.clone();
        self.save_study_sessions(&sessions)?;
        Ok(updated)
    }

    /// Finish an open session, fold it into progress, and clear a pending
    /// block when the session lasted at least `min_study`.
    ///
    /// Returns `None` for unknown or already finished sessions.
    pub fn end_study_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
        min_study: Duration,
    ) -> Result<Option<StudyOutcome>> {
        let mut sessions = self.study_sessions()?;
        let Some(session) = sessions
            .iter_mut()
            .find(|s| s.id == session_id && !s.is_finished())
        else {
            return Ok(None);
        };
        session.finish(now);
        let session = session.clone();
        self.save_study_sessions(&sessions)?;

        let mut progress = self.progress()?;
        progress.record_session(&session);
        self.save_progress(&progress)?;

        let long_enough = session.duration >= min_study.as_millis() as u64;
        let block_cleared = long_enough && self.blocking_settings()?.block_pending();
        if block_cleared {
            self.reset_block(now)?;
        }

        info!(
            session = %session.id,
            duration_ms = session.duration,
            learned = session.words_learned.len(),
            block_cleared,
            "study session ended"
        );
        Ok(Some(StudyOutcome {
            session,
            progress,
            block_cleared,
        }))
    }
}
