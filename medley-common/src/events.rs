//! Event types for the Medley event system
//!
//! Provides shared event definitions and the broadcast EventBus used by
//! Medley services to publish progress to SSE bridges and other listeners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Medley event types
///
/// Events are broadcast via EventBus and can be serialized for SSE
/// transmission. The history sync publishes its run lifecycle here so the
/// fire-and-forget trigger endpoint stays non-blocking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MedleyEvent {
    /// A history sync run began
    SyncRunStarted {
        /// When the run started
        timestamp: DateTime<Utc>,
    },

    /// One import category finished (successfully or abandoned)
    SyncCategoryCompleted {
        /// Category name ("transfer", "plugin", "download")
        category: String,
        /// Records written to the destination store
        written: u64,
        /// Records discarded by normalization rules
        skipped: u64,
        /// Records dropped on per-record errors
        failed: u64,
        /// Wall-clock seconds spent on the category
        elapsed_seconds: u64,
        /// When the category finished
        timestamp: DateTime<Utc>,
    },

    /// A history sync run finished; all enabled categories were processed
    SyncRunCompleted {
        /// When the run finished
        timestamp: DateTime<Utc>,
    },

    /// A history sync run aborted on a fatal error
    SyncRunFailed {
        /// Human-readable failure description
        error: String,
        /// When the run aborted
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast bus for Medley events
///
/// Wraps `tokio::sync::broadcast`: subscribers receive events emitted after
/// they subscribe; slow subscribers lose the oldest buffered events.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MedleyEvent>,
}

impl EventBus {
    /// Create a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<MedleyEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring the absence of subscribers
    ///
    /// Event delivery is best-effort; emitters never block or fail because
    /// nobody is listening.
    pub fn emit_lossy(&self, event: MedleyEvent) {
        let _ = self.tx.send(event);
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_reach_subscribers() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit_lossy(MedleyEvent::SyncRunStarted {
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, MedleyEvent::SyncRunStarted { .. }));
    }

    #[tokio::test]
    async fn emit_without_subscribers_is_silent() {
        let bus = EventBus::new(16);
        assert_eq!(bus.subscriber_count(), 0);

        // Must not panic or error
        bus.emit_lossy(MedleyEvent::SyncRunCompleted {
            timestamp: Utc::now(),
        });
    }

    #[test]
    fn category_event_serializes_with_type_tag() {
        let event = MedleyEvent::SyncCategoryCompleted {
            category: "transfer".to_string(),
            written: 2,
            skipped: 1,
            failed: 0,
            elapsed_seconds: 3,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SyncCategoryCompleted");
        assert_eq!(json["category"], "transfer");
        assert_eq!(json["written"], 2);
    }
}
