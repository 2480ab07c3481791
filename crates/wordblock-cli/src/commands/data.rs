use std::path::PathBuf;

use chrono::Utc;
use clap::Subcommand;
use wordblock_core::storage::Database;
use wordblock_core::StorageData;

use super::{print_json, CommandResult};

#[derive(Subcommand)]
pub enum DataAction {
    /// Export words, progress, settings and sessions as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Replace stored data with a previous export
    Import { path: PathBuf },
    /// Delete all stored data
    Clear {
        /// Required; there is no undo
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: DataAction) -> CommandResult {
    let db = Database::open()?;

    match action {
        DataAction::Export { output } => {
            db.set_last_sync_time(Utc::now())?;
            let data = db.export_data()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, serde_json::to_string_pretty(&data)?)?;
                    print_json(&serde_json::json!({
                        "exported": path,
                        "words": data.words.len(),
                    }))?;
                }
                None => print_json(&data)?,
            }
        }
        DataAction::Import { path } => {
            let raw = std::fs::read_to_string(&path)?;
            let data: StorageData = serde_json::from_str(&raw)?;
            db.import_data(&data)?;
            print_json(&serde_json::json!({ "imported": data.words.len() }))?;
        }
        DataAction::Clear { yes } => {
            if !yes {
                return Err("refusing to clear data without --yes".into());
            }
            db.clear_all_data()?;
            println!("all data cleared");
        }
    }
    Ok(())
}
