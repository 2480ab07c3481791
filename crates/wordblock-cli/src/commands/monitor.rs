use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Args;
use tracing::warn;
use wordblock_core::{Config, Event, UsagePoller};

use super::{open_shared, usage_source, CommandResult};

#[derive(Args)]
pub struct MonitorArgs {
    /// Seconds between usage checks (defaults to `monitoring.check_interval_secs`)
    #[arg(long)]
    check_interval: Option<u64>,
    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    duration: Option<u64>,
}

fn emit(event: &Event) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => warn!(error = %e, "event serialization failed"),
    }
}

pub fn run(args: MonitorArgs) -> CommandResult {
    let config = Config::load_or_default();
    let check_interval = args
        .check_interval
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.check_interval());
    let db = open_shared()?;
    let interval = db.with(|db| db.blocking_settings())?.interval_minutes;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let source = Arc::new(usage_source(&db, &config));
        let mut poller = UsagePoller::new(source, db, config.monitoring.app_id.clone());
        poller.set_block_callback(Arc::new(|block| emit(&Event::from(block))));
        let mut snapshots = poller.subscribe();

        emit(&Event::PollerStarted {
            interval_minutes: interval.minutes(),
            check_interval_secs: check_interval.as_secs(),
            at: Utc::now(),
        });
        poller.start(interval, check_interval);

        let deadline = async {
            match args.duration {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => pending::<()>().await,
            }
        };
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(deadline, ctrl_c);

        loop {
            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = snapshots.borrow_and_update().clone();
                    let at = snapshot.checked_at.unwrap_or_else(Utc::now);
                    if snapshot.permission_required {
                        emit(&Event::PermissionRequired { at });
                    } else {
                        emit(&Event::UsageChecked { status: snapshot.status, at });
                    }
                }
                _ = &mut ctrl_c => break,
                _ = &mut deadline => break,
            }
        }

        poller.stop();
        emit(&Event::PollerStopped { at: Utc::now() });
    });
    Ok(())
}
