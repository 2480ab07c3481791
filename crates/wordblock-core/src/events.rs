use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blocking::{BlockEvent, BlockingStatus};
use crate::study::StudyOutcome;

/// Every observable state change produces an Event.
/// The CLI prints them as JSON lines while monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    PollerStarted {
        interval_minutes: u32,
        check_interval_secs: u64,
        at: DateTime<Utc>,
    },
    PollerStopped {
        at: DateTime<Utc>,
    },
    /// Usage crossed the threshold; a learning session is required.
    BlockTriggered {
        interval_minutes: u32,
        at: DateTime<Utc>,
    },
    /// A study session long enough to lift the pending block ended.
    BlockCleared {
        session_id: String,
        at: DateTime<Utc>,
    },
    /// Usage access is not granted; the poller reports idle until it is.
    PermissionRequired {
        at: DateTime<Utc>,
    },
    StudySessionEnded {
        session_id: String,
        duration_ms: u64,
        words_learned: usize,
        at: DateTime<Utc>,
    },
    UsageChecked {
        status: BlockingStatus,
        at: DateTime<Utc>,
    },
}

impl From<BlockEvent> for Event {
    fn from(e: BlockEvent) -> Self {
        Event::BlockTriggered {
            interval_minutes: e.interval_minutes,
            at: e.timestamp,
        }
    }
}

impl Event {
    /// Events describing a finished study session, in order.
    pub fn from_study_outcome(outcome: &StudyOutcome) -> Vec<Event> {
        let at = outcome.session.end_time.unwrap_or(outcome.session.start_time);
        let mut events = vec![Event::StudySessionEnded {
            session_id: outcome.session.id.clone(),
            duration_ms: outcome.session.duration,
            words_learned: outcome.session.words_learned.len(),
            at,
        }];
        if outcome.block_cleared {
            events.push(Event::BlockCleared {
                session_id: outcome.session.id.clone(),
                at,
            });
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study::{StudySession, UserProgress};

    #[test]
    fn block_event_serializes_with_type_tag() {
        let at = Utc::now();
        let event: Event = BlockEvent {
            timestamp: at,
            interval_minutes: 20,
        }
        .into();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "BlockTriggered");
        assert_eq!(json["interval_minutes"], 20);
    }

    #[test]
    fn study_outcome_emits_clear_only_when_cleared() {
        let start = Utc::now();
        let mut session = StudySession::new(start);
        session.finish(start + chrono::Duration::seconds(30));
        let mut outcome = StudyOutcome {
            session,
            progress: UserProgress::default(),
            block_cleared: false,
        };
        assert_eq!(Event::from_study_outcome(&outcome).len(), 1);

        outcome.block_cleared = true;
        let events = Event::from_study_outcome(&outcome);
        assert!(matches!(events[1], Event::BlockCleared { .. }));
    }
}
