//! Vocabulary words and the selection rules used by study and review.
//!
//! Everything here is pure over a word slice; persistence lives in
//! [`crate::storage`].

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Medium
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" | "1" => Ok(Difficulty::Easy),
            "medium" | "2" => Ok(Difficulty::Medium),
            "hard" | "3" => Ok(Difficulty::Hard),
            other => Err(ValidationError::InvalidValue {
                field: "difficulty".into(),
                message: format!("'{other}' is not easy, medium or hard"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: String,
    pub word: String,
    pub definition: String,
    pub difficulty: Difficulty,
    pub is_learned: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub review_count: u32,
}

/// User submission for a new word.
#[derive(Debug, Clone)]
pub struct NewWord {
    pub word: String,
    pub definition: String,
    pub difficulty: Difficulty,
    pub is_learned: bool,
}

impl NewWord {
    pub fn new(word: impl Into<String>, definition: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            word: word.into(),
            definition: definition.into(),
            difficulty,
            is_learned: false,
        }
    }

    pub(crate) fn into_word(self, now: DateTime<Utc>) -> Result<Word, ValidationError> {
        let word = self.word.trim();
        let definition = self.definition.trim();
        if word.is_empty() {
            return Err(ValidationError::Empty("word"));
        }
        if definition.is_empty() {
            return Err(ValidationError::Empty("definition"));
        }
        Ok(Word {
            id: uuid::Uuid::new_v4().to_string(),
            word: word.to_string(),
            definition: definition.to_string(),
            difficulty: self.difficulty,
            is_learned: self.is_learned,
            created_at: now,
            last_reviewed: None,
            review_count: 0,
        })
    }
}

/// Partial update for a word.
#[derive(Debug, Clone, Default)]
pub struct WordPatch {
    pub word: Option<String>,
    pub definition: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub is_learned: Option<bool>,
}

impl WordPatch {
    pub(crate) fn apply(self, target: &mut Word) -> Result<(), ValidationError> {
        if let Some(w) = self.word {
            let w = w.trim();
            if w.is_empty() {
                return Err(ValidationError::Empty("word"));
            }
            target.word = w.to_string();
        }
        if let Some(d) = self.definition {
            let d = d.trim();
            if d.is_empty() {
                return Err(ValidationError::Empty("definition"));
            }
            target.definition = d.to_string();
        }
        if let Some(difficulty) = self.difficulty {
            target.difficulty = difficulty;
        }
        if let Some(learned) = self.is_learned {
            target.is_learned = learned;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordFilter {
    #[default]
    All,
    Learned,
    Unlearned,
}

impl WordFilter {
    pub fn matches(self, word: &Word) -> bool {
        match self {
            WordFilter::All => true,
            WordFilter::Learned => word.is_learned,
            WordFilter::Unlearned => !word.is_learned,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordStats {
    pub total: usize,
    pub learned: usize,
    pub unlearned: usize,
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

pub fn word_stats(words: &[Word]) -> WordStats {
    let mut stats = WordStats {
        total: words.len(),
        ..WordStats::default()
    };
    for w in words {
        if w.is_learned {
            stats.learned += 1;
        } else {
            stats.unlearned += 1;
        }
        match w.difficulty {
            Difficulty::Easy => stats.easy += 1,
            Difficulty::Medium => stats.medium += 1,
            Difficulty::Hard => stats.hard += 1,
        }
    }
    stats
}

/// Case-insensitive substring match on word or definition.
pub fn search<'a>(words: &'a [Word], query: &str, min_len: usize, max_results: usize) -> Vec<&'a Word> {
    let needle = query.trim().to_lowercase();
    if needle.chars().count() < min_len.max(1) {
        return Vec::new();
    }
    words
        .iter()
        .filter(|w| {
            w.word.to_lowercase().contains(&needle) || w.definition.to_lowercase().contains(&needle)
        })
        .take(max_results)
        .collect()
}

/// Unlearned words, easiest and least reviewed first.
pub fn for_study(words: &[Word], count: usize) -> Vec<Word> {
    let mut picked: Vec<Word> = words.iter().filter(|w| !w.is_learned).cloned().collect();
    picked.sort_by(|a, b| {
        a.difficulty
            .cmp(&b.difficulty)
            .then(a.review_count.cmp(&b.review_count))
    });
    picked.truncate(count);
    picked
}

/// Learned words; those not reviewed within `threshold` come first, then
/// least reviewed.
pub fn for_review(words: &[Word], count: usize, threshold: Duration, now: DateTime<Utc>) -> Vec<Word> {
    let due = |w: &Word| match w.last_reviewed {
        Some(at) => now - at > threshold,
        None => true,
    };
    let mut picked: Vec<Word> = words.iter().filter(|w| w.is_learned).cloned().collect();
    picked.sort_by(|a, b| {
        due(b)
            .cmp(&due(a))
            .then(a.review_count.cmp(&b.review_count))
    });
    picked.truncate(count);
    picked
}
