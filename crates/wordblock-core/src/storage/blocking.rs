use chrono::{DateTime, Utc};
use tracing::info;

use super::database::{Database, SharedDatabase};
use super::keys;
use crate::blocking::BlockingStore;
use crate::error::Result;
use crate::settings::{AppSettings, AppSettingsPatch, BlockingSettings, BlockingSettingsPatch};

impl Database {
    pub fn blocking_settings(&self) -> Result<BlockingSettings> {
        self.get_json(keys::BLOCKING_SETTINGS, BlockingSettings::default())
    }

    pub fn update_blocking_settings(&self, patch: BlockingSettingsPatch) -> Result<BlockingSettings> {
        let mut settings = self.blocking_settings()?;
        patch.apply(&mut settings);
        self.set_json(keys::BLOCKING_SETTINGS, &settings)?;
        Ok(settings)
    }

    /// Count a fired block and mark it pending.
    pub fn increment_block_count(&self, at: DateTime<Utc>) -> Result<BlockingSettings> {
        let mut settings = self.blocking_settings()?;
        settings.total_blocks_triggered += 1;
        settings.last_block_time = Some(at);
        self.set_json(keys::BLOCKING_SETTINGS, &settings)?;
        Ok(settings)
    }

    /// Clear a pending block. The usage window restarts at `at`.
    pub fn reset_block(&self, at: DateTime<Utc>) -> Result<BlockingSettings> {
        let mut settings = self.blocking_settings()?;
        settings.last_block_time = None;
        settings.last_cleared_time = Some(at);
        self.set_json(keys::BLOCKING_SETTINGS, &settings)?;
        info!(at = %at, "block cleared");
        Ok(settings)
    }

    pub fn app_settings(&self) -> Result<AppSettings> {
        self.get_json(keys::APP_SETTINGS, AppSettings::default())
    }

    pub fn update_app_settings(&self, patch: AppSettingsPatch) -> Result<AppSettings> {
        let mut settings = self.app_settings()?;
        patch.apply(&mut settings);
        self.set_json(keys::APP_SETTINGS, &settings)?;
        Ok(settings)
    }
}

impl BlockingStore for SharedDatabase {
    fn blocking_settings(&self) -> Result<BlockingSettings> {
        self.with(|db| db.blocking_settings())
    }

    fn update_blocking_settings(&self, patch: BlockingSettingsPatch) -> Result<BlockingSettings> {
        self.with(|db| db.update_blocking_settings(patch))
    }

    fn increment_block_count(&self, at: DateTime<Utc>) -> Result<BlockingSettings> {
        self.with(|db| db.increment_block_count(at))
    }
}
