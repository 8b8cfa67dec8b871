//! Delivery sinks.
//!
//! Both sinks are best effort. The realtime sink reports how many sessions
//! it reached; a user without a live connection simply misses the signal.
//! The push sink reports provider errors so they can be logged, but nothing
//! upstream ever acts on them.

use async_trait::async_trait;
use evently_core::push::PushMessage;
use evently_core::realtime::RealtimeMessage;
use evently_core::types::DbId;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for push delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider refused the notification.
    #[error("Push provider returned HTTP {status}: {reason}")]
    Rejected { status: u16, reason: String },

    /// The provider authentication token could not be signed.
    #[error("Provider token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// The signing key could not be read.
    #[error("Push configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Pub/sub channel keyed by user identity.
#[async_trait]
pub trait RealtimeSink: Send + Sync {
    /// Send `message` to every live session of each user in `user_ids`.
    ///
    /// Returns the number of sessions the message was queued on. An empty
    /// slice is a no-op.
    async fn notify(&self, user_ids: &[DbId], message: &RealtimeMessage) -> usize;
}

/// Push-notification provider keyed by device token.
#[async_trait]
pub trait PushSink: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError>;
}

/// Signal `user_ids` through `sink`.
///
/// Accepts a single id (`Some(id)`), no id (`None`), or any collection.
/// Duplicate ids are collapsed and nothing is sent when no id remains.
/// Every realtime delivery goes through here.
pub async fn notify_users<I>(sink: &dyn RealtimeSink, user_ids: I, message: &RealtimeMessage) -> usize
where
    I: IntoIterator<Item = DbId>,
{
    let mut ids: Vec<DbId> = Vec::new();
    for user_id in user_ids {
        if !ids.contains(&user_id) {
            ids.push(user_id);
        }
    }
    if ids.is_empty() {
        return 0;
    }
    sink.notify(&ids, message).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use evently_core::realtime::{ChangeAction, RealtimeContext};

    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(Vec<DbId>, RealtimeMessage)>>,
    }

    #[async_trait]
    impl RealtimeSink for Recorder {
        async fn notify(&self, user_ids: &[DbId], message: &RealtimeMessage) -> usize {
            self.calls
                .lock()
                .unwrap()
                .push((user_ids.to_vec(), message.clone()));
            user_ids.len()
        }
    }

    #[tokio::test]
    async fn empty_and_absent_audiences_are_no_ops() {
        let sink = Recorder::default();
        let message = RealtimeMessage::new(RealtimeContext::Event, 1, ChangeAction::Update);

        let none = notify_users(&sink, None, &message).await;
        let empty = notify_users(&sink, Vec::<DbId>::new(), &message).await;

        assert_eq!((none, empty), (0, 0));
        assert!(sink.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn single_id_and_duplicates_are_accepted() {
        let sink = Recorder::default();

        let friend = RealtimeMessage::new(RealtimeContext::Friend, 0, ChangeAction::Create);
        let deleted = RealtimeMessage::new(RealtimeContext::Event, 9, ChangeAction::Delete);
        notify_users(&sink, Some(4), &friend).await;
        notify_users(&sink, [5, 6, 5], &deleted).await;

        let calls = sink.calls.lock().unwrap();
        assert_eq!(calls[0].0, vec![4]);
        assert_eq!(calls[0].1.action, None);
        assert_eq!(calls[1].0, vec![5, 6]);
        assert_eq!(calls[1].1.action, Some(ChangeAction::Delete));
    }

    #[test]
    fn rejected_error_display() {
        let err = PushError::Rejected {
            status: 410,
            reason: "Unregistered".into(),
        };
        assert_eq!(err.to_string(), "Push provider returned HTTP 410: Unregistered");
    }
}
