//! Background usage poller.
//!
//! A single tokio task drives a periodic interval. Each tick reads the
//! blocking settings, asks the usage source for foreground time over the
//! trailing window, evaluates the policy, and fires the block hook once
//! per threshold crossing.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -> Running -> Stopped
//! ```
//!
//! Ticks never overlap: every evaluation, periodic or `check_now`, runs
//! under one gate, so a task left draining after `stop` cannot race a
//! restarted one. Periodic ticks run on the blocking pool and the interval
//! skips (rather than queues) ticks missed while one runs.
//!
//! ## Usage
//!
//! ```ignore
//! let mut poller = UsagePoller::new(source, store, "com.wordblock");
//! poller.set_block_callback(Arc::new(|event| println!("{event:?}")));
//! poller.start(BlockingInterval::Thirty, DEFAULT_CHECK_INTERVAL);
//! // ...
//! poller.stop();
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::interval::BlockingInterval;
use super::policy::{aggregate_foreground, evaluate, BlockingStatus};
use crate::error::Result;
use crate::settings::{BlockingSettings, BlockingSettingsPatch};
use crate::usage::UsageSource;

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// `tokio::time::interval` rejects a zero period.
const MIN_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// The poller's only externally observable event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockEvent {
    pub timestamp: DateTime<Utc>,
    pub interval_minutes: u32,
}

pub type BlockCallback = Arc<dyn Fn(BlockEvent) + Send + Sync>;

/// Persistence operations the poller needs.
pub trait BlockingStore: Send + Sync {
    fn blocking_settings(&self) -> Result<BlockingSettings>;

    fn update_blocking_settings(&self, patch: BlockingSettingsPatch) -> Result<BlockingSettings>;

    /// Record a fired block: bump the counter and mark the block pending.
    fn increment_block_count(&self, at: DateTime<Utc>) -> Result<BlockingSettings>;
}

/// Result of the most recent tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSnapshot {
    pub status: BlockingStatus,
    pub interval_minutes: u32,
    pub blocking_enabled: bool,
    pub permission_required: bool,
    pub block_pending: bool,
    /// `None` until the first tick has run.
    pub checked_at: Option<DateTime<Utc>>,
}

impl PollSnapshot {
    fn initial(interval: BlockingInterval) -> Self {
        Self {
            status: BlockingStatus::idle(interval.minutes()),
            interval_minutes: interval.minutes(),
            blocking_enabled: true,
            permission_required: false,
            block_pending: false,
            checked_at: None,
        }
    }
}

struct Shared {
    source: Arc<dyn UsageSource>,
    store: Arc<dyn BlockingStore>,
    own_app_id: String,
    on_block: Mutex<Option<BlockCallback>>,
    interval: Mutex<BlockingInterval>,
    snapshot_tx: watch::Sender<PollSnapshot>,
    tick_gate: Mutex<()>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Shared {
    fn interval(&self) -> BlockingInterval {
        *lock(&self.interval)
    }

    fn set_interval(&self, interval: BlockingInterval) {
        *lock(&self.interval) = interval;
    }

    fn publish(&self, snapshot: PollSnapshot) -> PollSnapshot {
        self.snapshot_tx.send_replace(snapshot.clone());
        snapshot
    }

    fn tick(&self, now: DateTime<Utc>) -> PollSnapshot {
        let _gate = lock(&self.tick_gate);
        let mut interval = self.interval();

        let settings = match self.store.blocking_settings() {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "reading blocking settings failed, discarding tick");
                return self.publish(PollSnapshot {
                    checked_at: Some(now),
                    ..PollSnapshot::initial(interval)
                });
            }
        };

        if settings.interval_minutes != interval {
            info!(
                from = interval.minutes(),
                to = settings.interval_minutes.minutes(),
                "blocking interval changed in settings"
            );
            interval = settings.interval_minutes;
            self.set_interval(interval);
        }

        let idle = PollSnapshot {
            status: BlockingStatus::idle(interval.minutes()),
            interval_minutes: interval.minutes(),
            blocking_enabled: settings.is_enabled,
            permission_required: false,
            block_pending: settings.block_pending(),
            checked_at: Some(now),
        };

        if !settings.is_enabled {
            debug!("blocking disabled");
            return self.publish(idle);
        }

        if !self.source.has_usage_access_permission() {
            debug!("usage access permission missing");
            return self.publish(PollSnapshot {
                permission_required: true,
                ..idle
            });
        }

        let window_start = window_start(&settings, interval, now);
        let usage = match self.source.aggregate_usage(window_start, now) {
            Ok(usage) => usage,
            Err(e) => {
                warn!(error = %e, "usage query failed, discarding tick");
                return self.publish(idle);
            }
        };

        let total = aggregate_foreground(&usage, &self.own_app_id);
        let status = evaluate(total, interval.minutes());
        debug!(
            total_usage_ms = total,
            max_allowed_ms = status.max_allowed_ms,
            pct = status.usage_percentage,
            "usage check"
        );

        let mut block_pending = settings.block_pending();
        if status.should_block && !block_pending {
            match self.store.increment_block_count(now) {
                Ok(updated) => {
                    block_pending = true;
                    info!(
                        interval_minutes = interval.minutes(),
                        total_blocks = updated.total_blocks_triggered,
                        "usage limit exceeded, block triggered"
                    );
                    let callback = lock(&self.on_block).clone();
                    if let Some(callback) = callback {
                        callback(BlockEvent {
                            timestamp: now,
                            interval_minutes: interval.minutes(),
                        });
                    }
                }
                // Nothing was recorded, so the next tick retries.
                Err(e) => warn!(error = %e, "recording block failed"),
            }
        }

        self.publish(PollSnapshot {
            status,
            block_pending,
            ..idle
        })
    }
}

/// Trailing window, restarted at the last time a block was cleared.
fn window_start(
    settings: &BlockingSettings,
    interval: BlockingInterval,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let trailing = now - chrono::Duration::milliseconds(interval.as_millis() as i64);
    match settings.last_cleared_time {
        Some(cleared) if cleared > trailing => cleared.min(now),
        _ => trailing,
    }
}

/// Periodic usage checker with an explicit `start`/`stop` lifecycle.
pub struct UsagePoller {
    shared: Arc<Shared>,
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl UsagePoller {
    pub fn new(
        source: Arc<dyn UsageSource>,
        store: Arc<dyn BlockingStore>,
        own_app_id: impl Into<String>,
    ) -> Self {
        let interval = BlockingInterval::default();
        let (snapshot_tx, _) = watch::channel(PollSnapshot::initial(interval));
        Self {
            shared: Arc::new(Shared {
                source,
                store,
                own_app_id: own_app_id.into(),
                on_block: Mutex::new(None),
                interval: Mutex::new(interval),
                snapshot_tx,
                tick_gate: Mutex::new(()),
            }),
            shutdown: None,
            task: None,
        }
    }

    /// Install the hook invoked once per block crossing.
    pub fn set_block_callback(&self, callback: BlockCallback) {
        *lock(&self.shared.on_block) = Some(callback);
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn interval(&self) -> BlockingInterval {
        self.shared.interval()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> PollSnapshot {
        self.shared.snapshot_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    /// Spawn the polling task. Must be called inside a tokio runtime.
    ///
    /// Returns `false` (and does nothing) when already running. The first
    /// tick fires immediately.
    pub fn start(&mut self, interval: BlockingInterval, check_interval: Duration) -> bool {
        if self.is_running() {
            debug!("usage poller already running");
            return false;
        }

        self.shared.set_interval(interval);
        let period = check_interval.max(MIN_CHECK_INTERVAL);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let shared = Arc::clone(&self.shared);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        let tick_shared = Arc::clone(&shared);
                        let run = tokio::task::spawn_blocking(move || {
                            tick_shared.tick(Utc::now());
                        });
                        if let Err(e) = run.await {
                            warn!(error = %e, "usage check panicked");
                        }
                    }
                }
            }
            debug!("usage poller task exited");
        });

        self.shutdown = Some(shutdown_tx);
        self.task = Some(task);
        info!(
            interval_minutes = interval.minutes(),
            check_interval_secs = period.as_secs(),
            "usage poller started"
        );
        true
    }

    /// Cancel pending ticks. A tick already in progress runs to completion.
    /// Returns whether the poller was running.
    pub fn stop(&mut self) -> bool {
        let was_running = self.is_running();
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }
        self.task = None;
        if was_running {
            info!("usage poller stopped");
        }
        was_running
    }

    /// Persist a settings change. A new interval applies from the next tick.
    pub fn update_settings(&self, patch: BlockingSettingsPatch) -> Result<BlockingSettings> {
        let updated = self.shared.store.update_blocking_settings(patch)?;
        self.shared.set_interval(updated.interval_minutes);
        Ok(updated)
    }

    /// Run one evaluation now, outside the periodic schedule.
    pub fn check_now(&self) -> PollSnapshot {
        self.shared.tick(Utc::now())
    }

    /// Run one evaluation as of `now`.
    pub fn check_at(&self, now: DateTime<Utc>) -> PollSnapshot {
        self.shared.tick(now)
    }
}

impl Drop for UsagePoller {
    fn drop(&mut self) {
        self.stop();
    }
}
