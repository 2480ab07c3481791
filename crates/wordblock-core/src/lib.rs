//! # WordBlock Core Library
//!
//! Core logic for WordBlock, a vocabulary trainer that doubles as a
//! screen-time limiter: once foreground usage of other apps exceeds the
//! configured interval, the device is flagged as blocked until a short
//! learning session is completed. Everything is reachable from the
//! standalone `wordblock` CLI.
//!
//! ## Architecture
//!
//! - **Blocking**: the pure usage-vs-interval policy and the background
//!   [`UsagePoller`] that evaluates it periodically
//! - **Usage**: the [`UsageSource`] seam to OS usage statistics and
//!   in-app screen tracking
//! - **Storage**: SQLite key-value documents and TOML configuration
//! - **Words / Study / Stats**: vocabulary, learning sessions, and the
//!   progress figures derived from them
//!
//! ## Key Components
//!
//! - [`UsagePoller`]: start/stop lifecycle around the periodic check
//! - [`Database`]: persistence of words, settings and sessions
//! - [`Config`]: application configuration management
//! - [`Event`]: observable state changes

pub mod blocking;
pub mod error;
pub mod events;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod study;
pub mod usage;
pub mod words;

pub use blocking::{
    BlockEvent, BlockingInterval, BlockingStatus, BlockingStore, PollSnapshot, UsagePoller,
};
pub use error::{ConfigError, CoreError, DatabaseError, UsageError, ValidationError};
pub use events::Event;
pub use settings::{AppSettings, BlockingSettings, BlockingSettingsPatch};
pub use storage::{Config, Database, SharedDatabase, StorageData};
pub use study::{StudyOutcome, StudySession, UserProgress};
pub use usage::{NullUsageSource, RecordedUsageSource, UsageSource};
pub use words::{Difficulty, NewWord, Word, WordFilter, WordPatch};
