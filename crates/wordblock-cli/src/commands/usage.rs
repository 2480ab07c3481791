use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use clap::Subcommand;
use wordblock_core::blocking::aggregate_foreground;
use wordblock_core::usage::{ScreenTracker, UsageSample};
use wordblock_core::{Config, UsageSource, ValidationError};

use super::{open_shared, print_json, usage_source, CommandResult};

#[derive(Subcommand)]
pub enum UsageAction {
    /// Record foreground time for an application
    Record {
        app_id: String,
        /// Foreground minutes
        #[arg(long)]
        minutes: u64,
        /// The sample started this many minutes ago (defaults to `--minutes`)
        #[arg(long)]
        ago: Option<u64>,
    },
    /// Foreground time per application over a trailing window
    Breakdown {
        /// Window length in minutes (defaults to the blocking interval)
        #[arg(long)]
        window: Option<u32>,
    },
    /// Screens ranked by visit time
    Screens {
        #[arg(long, default_value = "7")]
        days: u32,
    },
    /// Screen visits per day
    Daily {
        #[arg(long, default_value = "7")]
        days: u32,
    },
    /// Record a finished visit to an in-app screen
    Visit {
        screen: String,
        #[arg(long)]
        seconds: u64,
    },
    /// Drop screen visits older than 30 days
    Cleanup,
}

fn out_of_range(field: &str, amount: u64) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        message: format!("{amount} is out of range"),
    }
}

/// `now` minus `amount` units built by `unit`.
fn checked_ago(
    now: DateTime<Utc>,
    field: &str,
    amount: u64,
    unit: fn(i64) -> Option<Duration>,
) -> Result<DateTime<Utc>, ValidationError> {
    i64::try_from(amount)
        .ok()
        .and_then(unit)
        .and_then(|d| now.checked_sub_signed(d))
        .ok_or_else(|| out_of_range(field, amount))
}

pub fn run(action: UsageAction) -> CommandResult {
    let db = open_shared()?;
    let now = Utc::now();

    match action {
        UsageAction::Record {
            app_id,
            minutes,
            ago,
        } => {
            let duration_ms = minutes
                .checked_mul(60_000)
                .ok_or_else(|| out_of_range("minutes", minutes))?;
            let started = match ago {
                Some(ago) => checked_ago(now, "ago", ago, Duration::try_minutes)?,
                None => checked_ago(now, "minutes", minutes, Duration::try_minutes)?,
            };
            let sample = UsageSample {
                app_id,
                start_time: started,
                duration_ms,
            };
            db.with(|db| db.record_usage_sample(sample.clone()))?;
            print_json(&sample)?;
        }
        UsageAction::Breakdown { window } => {
            let config = Config::load_or_default();
            let minutes = match window {
                Some(m) => m,
                None => db.with(|db| db.blocking_settings())?.interval_minutes.minutes(),
            };
            let source = usage_source(&db, &config);
            let usage = source.aggregate_usage(now - Duration::minutes(i64::from(minutes)), now)?;
            let total = aggregate_foreground(&usage, &config.monitoring.app_id);
            let apps: BTreeMap<_, _> = usage.into_iter().collect();
            print_json(&serde_json::json!({
                "windowMinutes": minutes,
                "apps": apps,
                "totalMs": total,
            }))?;
        }
        UsageAction::Screens { days } => {
            print_json(&db.with(|db| db.most_used_screens(days, now))?)?;
        }
        UsageAction::Daily { days } => {
            print_json(&db.with(|db| db.daily_usage(days, now))?)?;
        }
        UsageAction::Visit { screen, seconds } => {
            let entered = checked_ago(now, "seconds", seconds, Duration::try_seconds)?;
            let mut tracker = ScreenTracker::new(Arc::clone(&db));
            tracker.enter_screen(&screen, entered)?;
            print_json(&tracker.end_current(now)?)?;
        }
        UsageAction::Cleanup => {
            let removed = db.with(|db| db.cleanup_usage_sessions(now))?;
            print_json(&serde_json::json!({ "removed": removed }))?;
        }
    }
    Ok(())
}
