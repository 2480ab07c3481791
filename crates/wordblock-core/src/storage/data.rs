use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::database::Database;
use super::keys;
use crate::error::Result;
use crate::settings::{AppSettings, BlockingSettings};
use crate::stats::{self, ChartBucket, Statistics};
use crate::study::{StudySession, UserProgress};
use crate::words::Word;

/// Full export of the user's data.
///
/// Usage samples and screen visits are device-local and not included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageData {
    #[serde(default)]
    pub words: Vec<Word>,
    #[serde(default)]
    pub progress: UserProgress,
    #[serde(default)]
    pub blocking_settings: BlockingSettings,
    #[serde(default)]
    pub app_settings: AppSettings,
    #[serde(default)]
    pub study_sessions: Vec<StudySession>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_time: Option<DateTime<Utc>>,
}

impl Database {
    pub fn export_data(&self) -> Result<StorageData> {
        Ok(StorageData {
            words: self.words()?,
            progress: self.progress()?,
            blocking_settings: self.blocking_settings()?,
            app_settings: self.app_settings()?,
            study_sessions: self.study_sessions()?,
            last_sync_time: self.last_sync_time()?,
        })
    }

    /// Replace every exported record family with `data`, in one transaction.
    pub fn import_data(&self, data: &StorageData) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;
        self.set_json(keys::WORDS, &data.words)?;
        self.set_json(keys::PROGRESS, &data.progress)?;
        self.set_json(keys::BLOCKING_SETTINGS, &data.blocking_settings)?;
        self.set_json(keys::APP_SETTINGS, &data.app_settings)?;
        self.set_json(keys::STUDY_SESSIONS, &data.study_sessions)?;
        match data.last_sync_time {
            Some(at) => self.set_json(keys::LAST_SYNC, &at)?,
            None => self.kv_remove(&[keys::LAST_SYNC])?,
        }
        // Imported counters may disagree with the imported list.
        self.save_words(&data.words)?;
        tx.commit()?;
        info!(words = data.words.len(), "data imported");
        Ok(())
    }

    /// Remove every stored record; reads fall back to first-launch defaults.
    pub fn clear_all_data(&self) -> Result<()> {
        self.kv_remove(&keys::ALL)?;
        info!("all data cleared");
        Ok(())
    }

    pub fn last_sync_time(&self) -> Result<Option<DateTime<Utc>>> {
        self.get_json(keys::LAST_SYNC, None)
    }

    pub fn set_last_sync_time(&self, now: DateTime<Utc>) -> Result<()> {
        self.set_json(keys::LAST_SYNC, &now)
    }

    pub fn statistics(&self, now: DateTime<Utc>) -> Result<Statistics> {
        Ok(stats::summarize(
            &self.progress()?,
            &self.blocking_settings()?,
            &self.study_sessions()?,
            now,
        ))
    }

    pub fn daily_study_minutes(&self, now: DateTime<Utc>) -> Result<Vec<ChartBucket>> {
        Ok(stats::daily_study_minutes(&self.study_sessions()?, now))
    }

    pub fn weekly_study_minutes(&self, now: DateTime<Utc>) -> Result<Vec<ChartBucket>> {
        Ok(stats::weekly_study_minutes(&self.study_sessions()?, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::words::{Difficulty, NewWord};

    fn seeded() -> Database {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        let w = db
            .add_word(NewWord::new("lucid", "clear", Difficulty::Easy), now)
            .unwrap();
        db.mark_word_learned(&w.id, now).unwrap();
        db.increment_block_count(now).unwrap();
        db.set_last_sync_time(now).unwrap();
        db
    }

    #[test]
    fn export_then_import_into_fresh_database() {
        let source = seeded();
        let exported = source.export_data().unwrap();
        assert_eq!(exported.words.len(), 1);
        assert!(exported.last_sync_time.is_some());

        let json = serde_json::to_string(&exported).unwrap();
        let target = Database::open_memory().unwrap();
        target.import_data(&serde_json::from_str(&json).unwrap()).unwrap();
        assert_eq!(target.export_data().unwrap(), exported);
    }

    #[test]
    fn import_recounts_progress() {
        let db = Database::open_memory().unwrap();
        let mut data = seeded().export_data().unwrap();
        data.progress.total_words = 99;
        data.progress.learned_words = 99;
        db.import_data(&data).unwrap();
        let p = db.progress().unwrap();
        assert_eq!((p.total_words, p.learned_words), (1, 1));
    }

    #[test]
    fn import_without_sync_time_drops_stored_one() {
        let db = seeded();
        db.import_data(&StorageData::default()).unwrap();
        assert_eq!(db.export_data().unwrap(), StorageData::default());
        assert!(db.last_sync_time().unwrap().is_none());

        let never_synced: StorageData =
            serde_json::from_str(r#"{"words":[],"studySessions":[]}"#).unwrap();
        Database::open_memory().unwrap().import_data(&never_synced).unwrap();
    }

    #[test]
    fn clear_restores_defaults() {
        let db = seeded();
        db.record_usage_sample(crate::usage::UsageSample {
            app_id: "com.video".into(),
            start_time: Utc::now(),
            duration_ms: 1_000,
        })
        .unwrap();
        db.clear_all_data().unwrap();
        assert_eq!(db.export_data().unwrap(), StorageData::default());
        assert!(db.usage_samples().unwrap().is_empty());
    }

    #[test]
    fn statistics_reflect_stored_records() {
        let db = seeded();
        let stats = db.statistics(Utc::now()).unwrap();
        assert_eq!(stats.total_words, 1);
        assert_eq!(stats.learned_words, 1);
        assert_eq!(stats.total_blocks_triggered, 1);
        assert_eq!(stats.learning_rate, 100.0);
    }
}
