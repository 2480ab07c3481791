pub mod block;
pub mod config;
pub mod data;
pub mod monitor;
pub mod stats;
pub mod study;
pub mod usage;
pub mod word;

use std::sync::Arc;

use serde::Serialize;
use wordblock_core::{Config, Database, RecordedUsageSource, SharedDatabase};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Usage source backed by recorded samples, with permission taken from
/// `monitoring.usage_access`.
pub fn usage_source(db: &Arc<SharedDatabase>, config: &Config) -> RecordedUsageSource {
    RecordedUsageSource::new(Arc::clone(db), config.monitoring.usage_access)
}

pub fn open_shared() -> Result<Arc<SharedDatabase>, Box<dyn std::error::Error>> {
    Ok(Arc::new(SharedDatabase::new(Database::open()?)))
}
