//! Persisted user-facing settings records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blocking::BlockingInterval;

/// Singleton blocking record, stored under `blocking_settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockingSettings {
    #[serde(default)]
    pub interval_minutes: BlockingInterval,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    /// Set when a block fires, cleared by a qualifying learning session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_block_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_blocks_triggered: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_cleared_time: Option<DateTime<Utc>>,
}

impl Default for BlockingSettings {
    fn default() -> Self {
        Self {
            interval_minutes: BlockingInterval::default(),
            is_enabled: true,
            last_block_time: None,
            total_blocks_triggered: 0,
            last_cleared_time: None,
        }
    }
}

impl BlockingSettings {
    pub fn block_pending(&self) -> bool {
        self.last_block_time.is_some()
    }
}

/// Partial update for [`BlockingSettings`]; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct BlockingSettingsPatch {
    pub interval_minutes: Option<BlockingInterval>,
    pub is_enabled: Option<bool>,
    pub last_block_time: Option<Option<DateTime<Utc>>>,
}

impl BlockingSettingsPatch {
    pub fn interval(interval: BlockingInterval) -> Self {
        Self {
            interval_minutes: Some(interval),
            ..Self::default()
        }
    }

    pub fn enabled(is_enabled: bool) -> Self {
        Self {
            is_enabled: Some(is_enabled),
            ..Self::default()
        }
    }

    pub fn apply(self, settings: &mut BlockingSettings) {
        if let Some(interval) = self.interval_minutes {
            settings.interval_minutes = interval;
        }
        if let Some(enabled) = self.is_enabled {
            settings.is_enabled = enabled;
        }
        if let Some(last) = self.last_block_time {
            settings.last_block_time = last;
        }
    }
}

/// General app preferences, stored under `app_settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub auto_save: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            notifications: true,
            sound_enabled: true,
            auto_save: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppSettingsPatch {
    pub notifications: Option<bool>,
    pub sound_enabled: Option<bool>,
    pub auto_save: Option<bool>,
}

impl AppSettingsPatch {
    pub fn apply(self, settings: &mut AppSettings) {
        if let Some(v) = self.notifications {
            settings.notifications = v;
        }
        if let Some(v) = self.sound_enabled {
            settings.sound_enabled = v;
        }
        if let Some(v) = self.auto_save {
            settings.auto_save = v;
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_first_launch() {
        let settings = BlockingSettings::default();
        assert_eq!(settings.interval_minutes, BlockingInterval::Fifteen);
        assert!(settings.is_enabled);
        assert!(!settings.block_pending());
        assert_eq!(settings.total_blocks_triggered, 0);
    }

    #[test]
    fn legacy_document_with_day_interval_is_clamped() {
        let json = r#"{"intervalMinutes":1440,"isEnabled":false,"totalBlocksTriggered":4}"#;
        let settings: BlockingSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.interval_minutes, BlockingInterval::OneHour);
        assert!(!settings.is_enabled);
        assert_eq!(settings.total_blocks_triggered, 4);
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut settings = BlockingSettings {
            total_blocks_triggered: 3,
            ..BlockingSettings::default()
        };
        BlockingSettingsPatch::interval(BlockingInterval::Thirty).apply(&mut settings);
        assert_eq!(settings.interval_minutes, BlockingInterval::Thirty);
        assert!(settings.is_enabled);
        assert_eq!(settings.total_blocks_triggered, 3);

        let mut app = AppSettings::default();
        AppSettingsPatch {
            sound_enabled: Some(false),
            ..AppSettingsPatch::default()
        }
        .apply(&mut app);
        assert!(!app.sound_enabled);
        assert!(app.notifications);
    }
}
