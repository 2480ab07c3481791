use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Usage allowance before the device is flagged for blocking.
///
/// Persisted as a plain number of minutes. Reading an unknown number
/// clamps it to the nearest allowed interval instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum BlockingInterval {
    Fifteen,
    Twenty,
    Thirty,
    OneHour,
}

impl BlockingInterval {
    pub const ALL: [BlockingInterval; 4] = [
        BlockingInterval::Fifteen,
        BlockingInterval::Twenty,
        BlockingInterval::Thirty,
        BlockingInterval::OneHour,
    ];

    pub fn minutes(self) -> u32 {
        match self {
            BlockingInterval::Fifteen => 15,
            BlockingInterval::Twenty => 20,
            BlockingInterval::Thirty => 30,
            BlockingInterval::OneHour => 60,
        }
    }

    pub fn as_millis(self) -> u64 {
        u64::from(self.minutes()) * 60_000
    }

    pub fn label(self) -> &'static str {
        match self {
            BlockingInterval::Fifteen => "15 minutes",
            BlockingInterval::Twenty => "20 minutes",
            BlockingInterval::Thirty => "30 minutes",
            BlockingInterval::OneHour => "1 hour",
        }
    }

    /// Strict conversion: only the enumerated minute values are accepted.
    pub fn from_minutes(minutes: u32) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|i| i.minutes() == minutes)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "intervalMinutes".into(),
                message: format!("{minutes} is not one of 15, 20, 30, 60"),
            })
    }

    /// Nearest allowed interval; ties resolve to the shorter one.
    pub fn clamp(minutes: u32) -> Self {
        Self::ALL
            .into_iter()
            .min_by_key(|i| i.minutes().abs_diff(minutes))
            .unwrap_or_default()
    }
}

impl Default for BlockingInterval {
    fn default() -> Self {
        BlockingInterval::Fifteen
    }
}

impl From<u32> for BlockingInterval {
    fn from(minutes: u32) -> Self {
        Self::clamp(minutes)
    }
}

impl From<BlockingInterval> for u32 {
    fn from(interval: BlockingInterval) -> Self {
        interval.minutes()
    }
}

impl std::fmt::Display for BlockingInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_conversion_accepts_only_enumerated_values() {
        assert_eq!(BlockingInterval::from_minutes(20).unwrap(), BlockingInterval::Twenty);
        assert!(BlockingInterval::from_minutes(25).is_err());
        assert!(BlockingInterval::from_minutes(0).is_err());
        assert!(BlockingInterval::from_minutes(1440).is_err());
    }

    #[test]
    fn clamp_picks_nearest() {
        assert_eq!(BlockingInterval::clamp(0), BlockingInterval::Fifteen);
        assert_eq!(BlockingInterval::clamp(17), BlockingInterval::Fifteen);
        assert_eq!(BlockingInterval::clamp(19), BlockingInterval::Twenty);
        assert_eq!(BlockingInterval::clamp(25), BlockingInterval::Twenty);
        assert_eq!(BlockingInterval::clamp(44), BlockingInterval::Thirty);
        assert_eq!(BlockingInterval::clamp(1440), BlockingInterval::OneHour);
    }

    #[test]
    fn serializes_as_minutes_and_clamps_on_read() {
        assert_eq!(serde_json::to_string(&BlockingInterval::Thirty).unwrap(), "30");
        let parsed: BlockingInterval = serde_json::from_str("1440").unwrap();
        assert_eq!(parsed, BlockingInterval::OneHour);
    }
}
