//! Usage-threshold policy.
//!
//! Pure arithmetic over an aggregate foreground time and the configured
//! interval. No I/O, no clock.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const MS_PER_MINUTE: f64 = 60_000.0;

/// Outcome of one policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockingStatus {
    pub should_block: bool,
    pub total_usage_ms: u64,
    pub max_allowed_ms: u64,
    /// 0.0 .. unbounded; above 100 once the interval is exceeded.
    pub usage_percentage: f64,
    /// Never negative.
    pub remaining_minutes: f64,
}

impl BlockingStatus {
    /// Status reported when no usage could be considered (blocking
    /// disabled, permission missing, query failed). Never blocks.
    pub fn idle(interval_minutes: u32) -> Self {
        Self {
            should_block: false,
            total_usage_ms: 0,
            max_allowed_ms: u64::from(interval_minutes) * 60_000,
            usage_percentage: 0.0,
            remaining_minutes: f64::from(interval_minutes),
        }
    }
}

/// Evaluate the blocking threshold.
///
/// Equality triggers: `total_usage_ms == interval * 60_000` blocks.
/// A zero interval never blocks.
pub fn evaluate(total_usage_ms: u64, interval_minutes: u32) -> BlockingStatus {
    let max_allowed_ms = u64::from(interval_minutes) * 60_000;
    if max_allowed_ms == 0 {
        return BlockingStatus {
            should_block: false,
            total_usage_ms,
            max_allowed_ms,
            usage_percentage: 0.0,
            remaining_minutes: 0.0,
        };
    }

    let used_minutes = total_usage_ms as f64 / MS_PER_MINUTE;
    BlockingStatus {
        should_block: total_usage_ms >= max_allowed_ms,
        total_usage_ms,
        max_allowed_ms,
        usage_percentage: total_usage_ms as f64 / max_allowed_ms as f64 * 100.0,
        remaining_minutes: (f64::from(interval_minutes) - used_minutes).max(0.0),
    }
}

/// Sum per-application foreground time, skipping `exclude_app_id`.
pub fn aggregate_foreground(usage: &HashMap<String, u64>, exclude_app_id: &str) -> u64 {
    usage
        .iter()
        .filter(|(app, _)| app.as_str() != exclude_app_id)
        .fold(0u64, |acc, (_, ms)| acc.saturating_add(*ms))
}
