use chrono::Utc;
use clap::{Subcommand, ValueEnum};
use wordblock_core::storage::Database;
use wordblock_core::{Config, CoreError, Difficulty, NewWord, WordFilter, WordPatch};

use super::{print_json, CommandResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum FilterArg {
    All,
    Learned,
    Unlearned,
}

impl From<FilterArg> for WordFilter {
    fn from(f: FilterArg) -> Self {
        match f {
            FilterArg::All => WordFilter::All,
            FilterArg::Learned => WordFilter::Learned,
            FilterArg::Unlearned => WordFilter::Unlearned,
        }
    }
}

#[derive(Subcommand)]
pub enum WordAction {
    /// Add a word
    Add {
        word: String,
        definition: String,
        /// easy, medium or hard (or 1-3)
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,
    },
    /// List words
    List {
        #[arg(long, value_enum, default_value = "all")]
        filter: FilterArg,
        #[arg(long)]
        difficulty: Option<Difficulty>,
    },
    /// Search words and definitions
    Search { query: String },
    /// Edit a word
    Update {
        id: String,
        #[arg(long)]
        word: Option<String>,
        #[arg(long)]
        definition: Option<String>,
        #[arg(long)]
        difficulty: Option<Difficulty>,
    },
    /// Delete a word
    Delete { id: String },
    /// Mark a word learned
    Learn { id: String },
    /// Mark a word not learned
    Unlearn { id: String },
    /// Word counts by state and difficulty
    Stats,
    /// Next unlearned words to study
    Study {
        #[arg(long)]
        count: Option<usize>,
    },
    /// Learned words due for review
    Review {
        #[arg(long)]
        count: Option<usize>,
    },
}

fn not_found(id: String) -> CoreError {
    CoreError::NotFound { kind: "word", id }
}

pub fn run(action: WordAction) -> CommandResult {
    let db = Database::open()?;
    let now = Utc::now();

    match action {
        WordAction::Add {
            word,
            definition,
            difficulty,
        } => {
            let word = db.add_word(NewWord::new(word, definition, difficulty), now)?;
            print_json(&word)?;
        }
        WordAction::List { filter, difficulty } => {
            let filter = WordFilter::from(filter);
            let words = match difficulty {
                Some(d) => {
                    let mut words = db.words_by_difficulty(d)?;
                    words.retain(|w| filter.matches(w));
                    words
                }
                None => db.words_by_filter(filter)?,
            };
            print_json(&words)?;
        }
        WordAction::Search { query } => {
            let config = Config::load_or_default();
            print_json(&db.search_words(&query, &config.search)?)?;
        }
        WordAction::Update {
            id,
            word,
            definition,
            difficulty,
        } => {
            let patch = WordPatch {
                word,
                definition,
                difficulty,
                is_learned: None,
            };
            let updated = db.update_word(&id, patch)?.ok_or_else(|| not_found(id))?;
            print_json(&updated)?;
        }
        WordAction::Delete { id } => {
            if !db.delete_word(&id)? {
                return Err(not_found(id).into());
            }
            print_json(&serde_json::json!({ "deleted": id }))?;
        }
        WordAction::Learn { id } => {
            let word = db.mark_word_learned(&id, now)?.ok_or_else(|| not_found(id))?;
            print_json(&word)?;
        }
        WordAction::Unlearn { id } => {
            let word = db
                .set_word_learned(&id, false, now)?
                .ok_or_else(|| not_found(id))?;
            print_json(&word)?;
        }
        WordAction::Stats => {
            print_json(&db.word_stats()?)?;
        }
        WordAction::Study { count } => {
            let config = Config::load_or_default();
            let count = count.unwrap_or(config.study.session_size);
            print_json(&db.words_for_study(count)?)?;
        }
        WordAction::Review { count } => {
            let config = Config::load_or_default();
            let count = count.unwrap_or(config.study.review_size);
            print_json(&db.words_for_review(count, config.review_threshold(), now)?)?;
        }
    }
    Ok(())
}
