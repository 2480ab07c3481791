use std::sync::Arc;

use chrono::Utc;
use clap::Subcommand;
use wordblock_core::settings::AppSettingsPatch;
use wordblock_core::{BlockingInterval, BlockingSettingsPatch, Config, UsagePoller, UsageSource};

use super::{open_shared, print_json, usage_source, CommandResult};

#[derive(Subcommand)]
pub enum BlockAction {
    /// Stored blocking settings
    Status,
    /// Run one usage check now; may trigger a block
    Check,
    /// Show or change app preferences
    Settings {
        #[arg(long)]
        notifications: Option<bool>,
        #[arg(long)]
        sound: Option<bool>,
        #[arg(long)]
        auto_save: Option<bool>,
    },
    /// Set the usage interval (15, 20, 30 or 60 minutes)
    SetInterval { minutes: u32 },
    /// Turn blocking on
    Enable,
    /// Turn blocking off
    Disable,
    /// Clear a pending block without a learning session
    Clear,
    /// Report usage access, pointing at how to grant it when missing
    Permission,
}

pub fn run(action: BlockAction) -> CommandResult {
    let db = open_shared()?;
    let config = Config::load_or_default();

    match action {
        BlockAction::Status => {
            let settings = db.with(|db| db.blocking_settings())?;
            print_json(&serde_json::json!({
                "settings": settings,
                "blockPending": settings.block_pending(),
                "intervalLabel": settings.interval_minutes.label(),
            }))?;
        }
        BlockAction::Check => {
            let source = Arc::new(usage_source(&db, &config));
            let poller = UsagePoller::new(source, db, config.monitoring.app_id.clone());
            print_json(&poller.check_now())?;
        }
        BlockAction::Settings {
            notifications,
            sound,
            auto_save,
        } => {
            let patch = AppSettingsPatch {
                notifications,
                sound_enabled: sound,
                auto_save,
            };
            print_json(&db.with(|db| db.update_app_settings(patch))?)?;
        }
        BlockAction::SetInterval { minutes } => {
            let interval = BlockingInterval::from_minutes(minutes)?;
            let patch = BlockingSettingsPatch::interval(interval);
            print_json(&db.with(|db| db.update_blocking_settings(patch))?)?;
        }
        BlockAction::Enable => {
            let patch = BlockingSettingsPatch::enabled(true);
            print_json(&db.with(|db| db.update_blocking_settings(patch))?)?;
        }
        BlockAction::Disable => {
            let patch = BlockingSettingsPatch::enabled(false);
            print_json(&db.with(|db| db.update_blocking_settings(patch))?)?;
        }
        BlockAction::Clear => {
            print_json(&db.with(|db| db.reset_block(Utc::now()))?)?;
        }
        BlockAction::Permission => {
            let source = usage_source(&db, &config);
            let granted = source.has_usage_access_permission();
            if !granted {
                source.open_usage_access_settings();
            }
            print_json(&serde_json::json!({ "granted": granted }))?;
        }
    }
    Ok(())
}
