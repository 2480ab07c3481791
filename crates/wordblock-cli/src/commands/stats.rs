use chrono::Utc;
use clap::Subcommand;
use wordblock_core::storage::Database;

use super::{print_json, CommandResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Totals, streaks and learning rate
    Summary,
    /// Study minutes for each of the last seven days
    Daily,
    /// Study minutes for each of the last four weeks
    Weekly,
}

pub fn run(action: StatsAction) -> CommandResult {
    let db = Database::open()?;
    let now = Utc::now();

    match action {
        StatsAction::Summary => print_json(&db.statistics(now)?)?,
        StatsAction::Daily => print_json(&db.daily_study_minutes(now)?)?,
        StatsAction::Weekly => print_json(&db.weekly_study_minutes(now)?)?,
    }
    Ok(())
}
