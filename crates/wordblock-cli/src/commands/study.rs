use chrono::Utc;
use clap::Subcommand;
use tracing::info;
use wordblock_core::storage::Database;
use wordblock_core::{Config, CoreError, Event};

use super::{print_json, CommandResult};

#[derive(Subcommand)]
pub enum StudyAction {
    /// Open a learning session
    Start,
    /// Record a studied word in an open session
    Record {
        session_id: String,
        word_id: String,
        /// The word was learned in this session
        #[arg(long)]
        learned: bool,
    },
    /// Finish a session; clears a pending block when long enough
    End { session_id: String },
    /// List recorded sessions
    List,
}

pub fn run(action: StudyAction) -> CommandResult {
    let db = Database::open()?;
    let now = Utc::now();

    match action {
        StudyAction::Start => {
            print_json(&db.start_study_session(now)?)?;
        }
        StudyAction::Record {
            session_id,
            word_id,
            learned,
        } => {
            print_json(&db.record_study(&session_id, &word_id, learned, now)?)?;
        }
        StudyAction::End { session_id } => {
            let config = Config::load_or_default();
            let outcome = db
                .end_study_session(&session_id, now, config.min_study())?
                .ok_or(CoreError::NotFound {
                    kind: "open study session",
                    id: session_id,
                })?;
            for event in Event::from_study_outcome(&outcome) {
                info!(event = %serde_json::to_string(&event)?, "study event");
            }
            print_json(&outcome)?;
        }
        StudyAction::List => {
            print_json(&db.study_sessions()?)?;
        }
    }
    Ok(())
}
