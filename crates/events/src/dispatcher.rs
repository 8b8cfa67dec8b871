//! Fire-and-forget delivery of a resolved fan-out.
//!
//! The HTTP response never waits on socket or provider I/O: callers resolve
//! the audience, hand the [`FanOut`] to [`NotificationDispatcher::dispatch`]
//! and return. Every failure is logged at `warn` and dropped; nothing is
//! retried.

use std::sync::Arc;

use evently_core::audience::FanOut;
use futures::future::join_all;
use tokio::task::JoinHandle;

use crate::sinks::{notify_users, PushSink, RealtimeSink};

/// What one delivery pass achieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Live sessions a realtime message was queued on.
    pub sessions_reached: usize,
    pub pushes_sent: usize,
    pub pushes_failed: usize,
}

/// Holds both sinks and delivers fan-outs to them.
#[derive(Clone)]
pub struct NotificationDispatcher {
    realtime: Arc<dyn RealtimeSink>,
    push: Arc<dyn PushSink>,
}

impl NotificationDispatcher {
    pub fn new(realtime: Arc<dyn RealtimeSink>, push: Arc<dyn PushSink>) -> Self {
        Self { realtime, push }
    }

    /// Deliver `fan_out` on a background task.
    ///
    /// The returned handle is only useful to tests; production callers drop it.
    pub fn dispatch(&self, fan_out: FanOut) -> JoinHandle<DispatchReport> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.deliver(fan_out).await })
    }

    /// Deliver `fan_out` and wait for every sink call to finish.
    ///
    /// Signals go out first, then all pushes concurrently.
    pub async fn deliver(&self, fan_out: FanOut) -> DispatchReport {
        let mut report = DispatchReport::default();

        for signal in &fan_out.signals {
            report.sessions_reached += notify_users(
                self.realtime.as_ref(),
                signal.user_ids.iter().copied(),
                &signal.message,
            )
            .await;
        }

        let sends = fan_out.pushes.iter().map(|message| async move {
            let result = self.push.send(message).await;
            if let Err(e) = &result {
                tracing::warn!(
                    event_id = message.event_id,
                    kind = message.kind.as_str(),
                    error = %e,
                    "Push delivery failed",
                );
            }
            result.is_ok()
        });
        for sent in join_all(sends).await {
            if sent {
                report.pushes_sent += 1;
            } else {
                report.pushes_failed += 1;
            }
        }

        if !fan_out.is_empty() {
            tracing::debug!(
                signals = fan_out.signals.len(),
                sessions = report.sessions_reached,
                pushes_sent = report.pushes_sent,
                pushes_failed = report.pushes_failed,
                "Notification fan-out delivered",
            );
        }
        report
    }
}
