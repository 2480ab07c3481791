use chrono::{DateTime, Duration, Utc};

use super::config::SearchConfig;
use super::database::Database;
use super::keys;
use crate::error::{CoreError, Result};
use crate::study::UserProgress;
use crate::words::{self, Difficulty, NewWord, Word, WordFilter, WordPatch, WordStats};

impl Database {
    pub fn words(&self) -> Result<Vec<Word>> {
        self.get_json(keys::WORDS, Vec::new())
    }

    /// Replace the word list and recount progress.
    pub fn save_words(&self, words: &[Word]) -> Result<()> {
        self.set_json(keys::WORDS, words)?;
        self.sync_word_counts(words)?;
        Ok(())
    }

    pub fn progress(&self) -> Result<UserProgress> {
        self.get_json(keys::PROGRESS, UserProgress::default())
    }

    pub fn save_progress(&self, progress: &UserProgress) -> Result<()> {
        self.set_json(keys::PROGRESS, progress)
    }

    /// Word counts in progress are always derived from the list itself,
    /// which keeps `learned_words <= total_words`.
    fn sync_word_counts(&self, words: &[Word]) -> Result<UserProgress> {
        let mut progress = self.progress()?;
        progress.total_words = words.len() as u64;
        progress.learned_words = words.iter().filter(|w| w.is_learned).count() as u64;
        self.save_progress(&progress)?;
        Ok(progress)
    }

    pub fn word(&self, id: &str) -> Result<Option<Word>> {
        Ok(self.words()?.into_iter().find(|w| w.id == id))
    }

    pub fn add_word(&self, new: NewWord, now: DateTime<Utc>) -> Result<Word> {
        let word = new.into_word(now)?;
        let mut words = self.words()?;
        words.push(word.clone());
        self.save_words(&words)?;
        Ok(word)
    }

    pub fn update_word(&self, id: &str, patch: WordPatch) -> Result<Option<Word>> {
        self.modify_word(id, |w| patch.apply(w).map_err(CoreError::from))
    }

    pub fn delete_word(&self, id: &str) -> Result<bool> {
        let mut words = self.words()?;
        let before = words.len();
        words.retain(|w| w.id != id);
        if words.len() == before {
            return Ok(false);
        }
        self.save_words(&words)?;
        Ok(true)
    }

    pub fn mark_word_learned(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Word>> {
        self.set_word_learned(id, true, now)
    }

    /// Set or clear the learned flag. Marking learned also counts as a review
    /// timestamp.
    pub fn set_word_learned(&self, id: &str, learned: bool, now: DateTime<Utc>) -> Result<Option<Word>> {
        self.modify_word(id, |w| {
            w.is_learned = learned;
            if learned {
                w.last_reviewed = Some(now);
            }
            Ok(())
        })
    }

    pub fn record_review(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Word>> {
        self.modify_word(id, |w| {
            w.review_count += 1;
            w.last_reviewed = Some(now);
            Ok(())
        })
    }

    fn modify_word(&self, id: &str, f: impl FnOnce(&mut Word) -> Result<()>) -> Result<Option<Word>> {
        let mut words = self.words()?;
        let Some(word) = words.iter_mut().find(|w| w.id == id) else {
            return Ok(None);
        };
        f(word)?;
        let updated = word.clone();
        self.save_words(&words)?;
        Ok(Some(updated))
    }

    pub fn words_by_filter(&self, filter: WordFilter) -> Result<Vec<Word>> {
        Ok(self.words()?.into_iter().filter(|w| filter.matches(w)).collect())
    }

    pub fn words_by_difficulty(&self, difficulty: Difficulty) -> Result<Vec<Word>> {
        Ok(self
            .words()?
            .into_iter()
            .filter(|w| w.difficulty == difficulty)
            .collect())
    }

    pub fn search_words(&self, query: &str, config: &SearchConfig) -> Result<Vec<Word>> {
        let all = self.words()?;
        Ok(words::search(&all, query, config.min_query_length, config.max_results)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn words_for_study(&self, count: usize) -> Result<Vec<Word>> {
        Ok(words::for_study(&self.words()?, count))
    }

    pub fn words_for_review(&self, count: usize, threshold: Duration, now: DateTime<Utc>) -> Result<Vec<Word>> {
        Ok(words::for_review(&self.words()?, count, threshold, now))
    }

    pub fn word_stats(&self) -> Result<WordStats> {
        Ok(words::word_stats(&self.words()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(db: &Database, text: &str) -> Word {
        db.add_word(NewWord::new(text, format!("def {text}"), Difficulty::Easy), Utc::now())
            .unwrap()
    }

    #[test]
    fn crud_keeps_progress_counts_in_sync() {
        let db = Database::open_memory().unwrap();
        let a = add(&db, "alpha");
        let b = add(&db, "beta");
        assert_eq!(db.progress().unwrap().total_words, 2);

        db.mark_word_learned(&a.id, Utc::now()).unwrap();
        // Marking twice must not double count.
        db.mark_word_learned(&a.id, Utc::now()).unwrap();
        let p = db.progress().unwrap();
        assert_eq!((p.total_words, p.learned_words), (2, 1));

        assert!(db.delete_word(&a.id).unwrap());
        assert!(!db.delete_word(&a.id).unwrap());
        let p = db.progress().unwrap();
        assert_eq!((p.total_words, p.learned_words), (1, 0));

        let updated = db
            .update_word(
                &b.id,
                WordPatch {
                    definition: Some("second letter".into()),
                    ..WordPatch::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.definition, "second letter");
        assert!(db.update_word("missing", WordPatch::default()).unwrap().is_none());
    }

    #[test]
    fn invalid_patch_is_rejected_without_writing() {
        let db = Database::open_memory().unwrap();
        let a = add(&db, "alpha");
        let result = db.update_word(
            &a.id,
            WordPatch {
                word: Some("   ".into()),
                ..WordPatch::default()
            },
        );
        assert!(result.is_err());
        assert_eq!(db.word(&a.id).unwrap().unwrap().word, "alpha");
    }

    #[test]
    fn reviews_and_toggles() {
        let db = Database::open_memory().unwrap();
        let a = add(&db, "alpha");
        db.record_review(&a.id, Utc::now()).unwrap();
        let w = db.record_review(&a.id, Utc::now()).unwrap().unwrap();
        assert_eq!(w.review_count, 2);
        assert!(w.last_reviewed.is_some());

        db.set_word_learned(&a.id, true, Utc::now()).unwrap();
        assert_eq!(db.words_by_filter(WordFilter::Learned).unwrap().len(), 1);
        db.set_word_learned(&a.id, false, Utc::now()).unwrap();
        assert_eq!(db.words_by_filter(WordFilter::Unlearned).unwrap().len(), 1);
    }
}
